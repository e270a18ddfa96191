//! # Core Type Definitions
//!
//! This module contains all core types for the gradebook:
//! - Identifiers (`StudentId`) and subject names (`Subject`)
//! - Fixed-point scores (`Score`)
//! - Records (`GradeRecord`, `StudentRecord`) and their write models
//!   (`NewStudent`, `StudentUpdate`)
//! - Error types (`GradebookError`)
//!
//! ## Fixed-Point Scores
//!
//! Scores are stored as hundredths in a `u16`: 4.25 is `Score(425)`.
//! All averaging and rounding is integer arithmetic. Floating point appears
//! only where a score crosses the JSON boundary.

use crate::primitives::{
    DEFAULT_SCORE_HUNDREDTHS, MAX_LRN_LENGTH, MAX_NAME_LENGTH, MAX_NICKNAME_LENGTH,
    MAX_SCORE_HUNDREDTHS, MAX_SUBJECT_LENGTH, MIN_SCORE_HUNDREDTHS, QUARTERS, SUBJECTS,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique identifier of a student record.
///
/// Assigned sequentially by the store, starting at 1. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub u64);

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a subject, e.g. `"Math 2"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subject(pub String);

impl Subject {
    /// Create a new subject from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the subject as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check the name is non-empty and within `MAX_SUBJECT_LENGTH`.
    pub fn validate(&self) -> Result<(), GradebookError> {
        if self.0.trim().is_empty() {
            return Err(GradebookError::InvalidField(
                "subject name must not be empty".to_string(),
            ));
        }
        if self.0.len() > MAX_SUBJECT_LENGTH {
            return Err(GradebookError::InvalidField(format!(
                "subject name exceeds {} bytes",
                MAX_SUBJECT_LENGTH
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// SCORE
// =============================================================================

/// A score with two-decimal precision, stored as hundredths.
///
/// Quarter scores live in `[1.00, 5.00]`. Derived averages share the type;
/// the overall average of a student with no subjects is `Score::ZERO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Score(u16);

impl Score {
    /// 0.00, the overall average of a student without subjects.
    pub const ZERO: Self = Self(0);
    /// 1.00, the lowest quarter score.
    pub const MIN: Self = Self(MIN_SCORE_HUNDREDTHS);
    /// 5.00, the highest quarter score.
    pub const MAX: Self = Self(MAX_SCORE_HUNDREDTHS);
    /// 5.00, assigned to missing or unparseable quarters.
    pub const DEFAULT: Self = Self(DEFAULT_SCORE_HUNDREDTHS);

    /// Create a score from a raw hundredths value.
    #[must_use]
    pub const fn from_hundredths(hundredths: u16) -> Self {
        Self(hundredths)
    }

    /// Raw hundredths value.
    #[must_use]
    pub const fn hundredths(self) -> u16 {
        self.0
    }

    /// Clamp into the quarter-score domain `[1.00, 5.00]`.
    #[must_use]
    pub fn clamp_quarter(self) -> Self {
        Self(self.0.clamp(MIN_SCORE_HUNDREDTHS, MAX_SCORE_HUNDREDTHS))
    }

    /// Check whether the score is a valid quarter score.
    #[must_use]
    pub fn is_quarter(self) -> bool {
        (MIN_SCORE_HUNDREDTHS..=MAX_SCORE_HUNDREDTHS).contains(&self.0)
    }

    /// Parse a decimal string into a quarter score.
    ///
    /// The value is rounded to two decimals (half to even) and clamped into
    /// `[1.00, 5.00]`. Returns `None` for anything that is not a decimal
    /// number (`"4"`, `"-2.5"`, `".75"`, `"3."`, `"1e0"` are accepted).
    #[must_use]
    pub fn parse_quarter(input: &str) -> Option<Self> {
        let hundredths = parse_hundredths(input)?;
        let clamped = hundredths.clamp(
            i64::from(MIN_SCORE_HUNDREDTHS),
            i64::from(MAX_SCORE_HUNDREDTHS),
        );
        u16::try_from(clamped).ok().map(Self)
    }

    /// Mean of `count` scores whose hundredths sum to `sum`, rounded to two
    /// decimals (half to even). Returns `Score::ZERO` when `count` is 0.
    #[must_use]
    pub fn mean(sum: u64, count: u64) -> Self {
        if count == 0 {
            return Self::ZERO;
        }
        let quotient = sum / count;
        let remainder = sum % count;
        let doubled = remainder.saturating_mul(2);
        let rounded = if doubled > count || (doubled == count && quotient % 2 == 1) {
            quotient.saturating_add(1)
        } else {
            quotient
        };
        Self(u16::try_from(rounded).unwrap_or(u16::MAX))
    }

    /// Convert to `f64` for JSON output.
    #[allow(clippy::float_arithmetic)]
    #[must_use]
    pub fn to_f64(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ScoreVisitor)
    }
}

struct ScoreVisitor;

impl ScoreVisitor {
    fn from_decimal<E: de::Error>(text: &str) -> Result<Score, E> {
        // Large values saturate; `GradeRecord::new` clamps them to 5.00.
        parse_hundredths(text)
            .filter(|h| *h >= 0)
            .map(|h| Score(u16::try_from(h).unwrap_or(u16::MAX)))
            .ok_or_else(|| E::custom(format!("invalid score: {text}")))
    }
}

impl de::Visitor<'_> for ScoreVisitor {
    type Value = Score;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative decimal score")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Score, E> {
        // Display for f64 never uses exponent notation.
        Self::from_decimal(&v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Score, E> {
        Self::from_decimal(&v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Score, E> {
        Self::from_decimal(&v.to_string())
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Score, E> {
        Self::from_decimal(v)
    }
}

/// Parse an optional `e`/`E` exponent: an optionally signed digit run.
fn parse_exponent(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let magnitude = digits.bytes().fold(0i64, |acc, b| {
        acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
    });
    Some(if negative { -magnitude } else { magnitude })
}

/// Move the decimal point of `int_part.frac_part` by `exponent` places.
///
/// Digits shifted three or more places past the second decimal can no
/// longer affect rounding, and integer parts past 19 digits saturate, so
/// the shift is bounded to keep the result small.
fn shift_point(int_part: &str, frac_part: &str, exponent: i64) -> (String, String) {
    let digits = format!("{int_part}{frac_part}");
    let len = digits.len() as i64;
    let point = (int_part.len() as i64)
        .saturating_add(exponent)
        .clamp(-3, len.saturating_add(20));

    if point <= 0 {
        let zeros = "0".repeat(point.unsigned_abs() as usize);
        (String::new(), format!("{zeros}{digits}"))
    } else if point >= len {
        let zeros = "0".repeat((point - len) as usize);
        (format!("{digits}{zeros}"), String::new())
    } else {
        let (int, frac) = digits.split_at(point as usize);
        (int.to_string(), frac.to_string())
    }
}

/// Parse a signed decimal, with an optional exponent, into hundredths,
/// rounding half to even.
///
/// Saturates instead of overflowing on absurdly long integer parts.
fn parse_hundredths(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((m, e)) => (m, Some(parse_exponent(e)?)),
        None => (unsigned, None),
    };

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let shifted = exponent.map(|exp| shift_point(int_part, frac_part, exp));
    let (int_part, frac_part) = match &shifted {
        Some((int, frac)) => (int.as_str(), frac.as_str()),
        None => (int_part, frac_part),
    };

    let whole = int_part.bytes().fold(0i64, |acc, b| {
        acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
    });

    let frac = frac_part.as_bytes();
    let digit = |i: usize| frac.get(i).map_or(0, |b| i64::from(b - b'0'));
    let mut value = whole
        .saturating_mul(100)
        .saturating_add(digit(0) * 10 + digit(1));

    // Round on the digits past the second decimal.
    let rest = frac.get(2..).unwrap_or(&[]);
    if let Some((&first, tail)) = rest.split_first() {
        let tail_nonzero = tail.iter().any(|&b| b != b'0');
        let round_up = match first {
            b'6'..=b'9' => true,
            b'5' => tail_nonzero || value % 2 == 1,
            _ => false,
        };
        if round_up {
            value = value.saturating_add(1);
        }
    }

    Some(if negative { -value } else { value })
}

// =============================================================================
// GRADE RECORD
// =============================================================================

/// The four quarter scores of one subject for one student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradeRecord {
    pub quarters: [Score; QUARTERS],
}

impl Default for GradeRecord {
    fn default() -> Self {
        Self {
            quarters: [Score::DEFAULT; QUARTERS],
        }
    }
}

impl GradeRecord {
    /// Create a grade record, clamping every quarter into `[1.00, 5.00]`.
    #[must_use]
    pub fn new(quarters: [Score; QUARTERS]) -> Self {
        Self {
            quarters: quarters.map(Score::clamp_quarter),
        }
    }

    /// Check whether any quarter is exactly 5.00.
    #[must_use]
    pub fn has_max_quarter(&self) -> bool {
        self.quarters.contains(&Score::MAX)
    }

    /// Subject average: mean of the four quarters, rounded to two decimals.
    ///
    /// A single quarter at 5.00 forces the average to 5.00.
    #[must_use]
    pub fn average(&self) -> Score {
        if self.has_max_quarter() {
            return Score::MAX;
        }
        let sum: u64 = self.quarters.iter().map(|q| u64::from(q.hundredths())).sum();
        Score::mean(sum, QUARTERS as u64)
    }
}

// =============================================================================
// STUDENT RECORD
// =============================================================================

/// A stored student with identity fields and per-subject grades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: StudentId,
    pub name: String,
    pub lrn: Option<String>,
    pub nickname: Option<String>,
    pub created_at: NaiveDateTime,
    pub grades: BTreeMap<Subject, GradeRecord>,
}

impl StudentRecord {
    /// Check whether the student has a grade for `subject`.
    #[must_use]
    pub fn has_subject(&self, subject: &Subject) -> bool {
        self.grades.contains_key(subject)
    }
}

/// Everything needed to create a student; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub name: String,
    pub lrn: Option<String>,
    pub nickname: Option<String>,
    pub grades: BTreeMap<Subject, GradeRecord>,
}

impl NewStudent {
    /// A student enrolled in every subject of `SUBJECTS` at the default score.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lrn: None,
            nickname: None,
            grades: default_grades(),
        }
    }

    /// A student with exactly the given grades.
    #[must_use]
    pub fn with_grades(name: impl Into<String>, grades: BTreeMap<Subject, GradeRecord>) -> Self {
        Self {
            name: name.into(),
            lrn: None,
            nickname: None,
            grades,
        }
    }

    #[must_use]
    pub fn lrn(mut self, lrn: impl Into<String>) -> Self {
        self.lrn = Some(lrn.into());
        self
    }

    #[must_use]
    pub fn nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    /// Set (or replace) the grade of one subject.
    #[must_use]
    pub fn grade(mut self, subject: impl Into<String>, grade: GradeRecord) -> Self {
        self.grades.insert(Subject::new(subject), grade);
        self
    }

    /// Validate and normalize all fields.
    ///
    /// The name is trimmed and must be non-empty; empty optional fields
    /// become `None`; quarters are clamped into `[1.00, 5.00]`.
    pub fn validate(self) -> Result<Self, GradebookError> {
        let name = validate_name(&self.name)?;
        let lrn = normalize_optional(self.lrn, MAX_LRN_LENGTH, "lrn")?;
        let nickname = normalize_optional(self.nickname, MAX_NICKNAME_LENGTH, "nickname")?;
        for subject in self.grades.keys() {
            subject.validate()?;
        }
        let grades = self
            .grades
            .into_iter()
            .map(|(subject, grade)| (subject, GradeRecord::new(grade.quarters)))
            .collect();
        Ok(Self {
            name,
            lrn,
            nickname,
            grades,
        })
    }

    /// Build the stored record once the store has picked an id and timestamp.
    #[must_use]
    pub fn into_record(self, id: StudentId, created_at: NaiveDateTime) -> StudentRecord {
        StudentRecord {
            id,
            name: self.name,
            lrn: self.lrn,
            nickname: self.nickname,
            created_at,
            grades: self.grades,
        }
    }
}

/// A partial update of a student record.
///
/// `None` fields are left untouched. `Some("")` clears `lrn` or `nickname`.
/// Grades are only applied to subjects the student already has.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentUpdate {
    pub name: Option<String>,
    pub lrn: Option<String>,
    pub nickname: Option<String>,
    pub grades: BTreeMap<Subject, GradeRecord>,
}

impl StudentUpdate {
    /// Apply to `record`. Validation happens before any field is touched,
    /// so a rejected update leaves the record unchanged.
    pub fn apply_to(self, record: &mut StudentRecord) -> Result<(), GradebookError> {
        let name = self.name.as_deref().map(validate_name).transpose()?;
        let lrn = self
            .lrn
            .map(|v| normalize_optional(Some(v), MAX_LRN_LENGTH, "lrn"))
            .transpose()?;
        let nickname = self
            .nickname
            .map(|v| normalize_optional(Some(v), MAX_NICKNAME_LENGTH, "nickname"))
            .transpose()?;

        if let Some(name) = name {
            record.name = name;
        }
        if let Some(lrn) = lrn {
            record.lrn = lrn;
        }
        if let Some(nickname) = nickname {
            record.nickname = nickname;
        }
        for (subject, grade) in self.grades {
            if let Some(existing) = record.grades.get_mut(&subject) {
                *existing = GradeRecord::new(grade.quarters);
            }
        }
        Ok(())
    }
}

/// One default grade record per subject in `SUBJECTS`.
#[must_use]
pub fn default_grades() -> BTreeMap<Subject, GradeRecord> {
    SUBJECTS
        .iter()
        .map(|s| (Subject::new(*s), GradeRecord::default()))
        .collect()
}

fn validate_name(name: &str) -> Result<String, GradebookError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(GradebookError::EmptyName);
    }
    if trimmed.len() > MAX_NAME_LENGTH {
        return Err(GradebookError::InvalidField(format!(
            "name exceeds {} bytes",
            MAX_NAME_LENGTH
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional(
    value: Option<String>,
    max_len: usize,
    field: &str,
) -> Result<Option<String>, GradebookError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.len() > max_len {
        return Err(GradebookError::InvalidField(format!(
            "{} exceeds {} bytes",
            field, max_len
        )));
    }
    Ok(Some(trimmed.to_string()))
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the gradebook.
///
/// The CORE never panics; every failure is returned as one of these.
#[derive(Debug, Error)]
pub enum GradebookError {
    /// A student was created or renamed with an empty name.
    #[error("Name is required")]
    EmptyName,

    /// A field failed validation (length limits, empty subject).
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// No student with this identifier exists.
    #[error("Student not found: {0}")]
    StudentNotFound(StudentId),

    /// An imported student document is malformed or incomplete.
    #[error("Invalid student document: {0}")]
    InvalidDocument(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O or storage error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn q(h: u16) -> Score {
        Score::from_hundredths(h)
    }

    #[test]
    fn score_display_two_decimals() {
        assert_eq!(q(425).to_string(), "4.25");
        assert_eq!(q(100).to_string(), "1.00");
        assert_eq!(q(5).to_string(), "0.05");
    }

    #[test]
    fn parse_quarter_plain_values() {
        assert_eq!(Score::parse_quarter("4"), Some(q(400)));
        assert_eq!(Score::parse_quarter(" 2.5 "), Some(q(250)));
        assert_eq!(Score::parse_quarter(".75"), Some(Score::MIN));
        assert_eq!(Score::parse_quarter("3."), Some(q(300)));
        assert_eq!(Score::parse_quarter("+1.25"), Some(q(125)));
    }

    #[test]
    fn parse_quarter_clamps_out_of_range() {
        assert_eq!(Score::parse_quarter("7"), Some(Score::MAX));
        assert_eq!(Score::parse_quarter("-2"), Some(Score::MIN));
        assert_eq!(Score::parse_quarter("0.5"), Some(Score::MIN));
        assert_eq!(
            Score::parse_quarter("99999999999999999999999999"),
            Some(Score::MAX)
        );
    }

    #[test]
    fn parse_quarter_rounds_half_to_even() {
        assert_eq!(Score::parse_quarter("2.125"), Some(q(212)));
        assert_eq!(Score::parse_quarter("2.135"), Some(q(214)));
        assert_eq!(Score::parse_quarter("2.1251"), Some(q(213)));
        assert_eq!(Score::parse_quarter("2.129"), Some(q(213)));
        assert_eq!(Score::parse_quarter("2.124"), Some(q(212)));
    }

    #[test]
    fn parse_quarter_rejects_garbage() {
        assert_eq!(Score::parse_quarter(""), None);
        assert_eq!(Score::parse_quarter("abc"), None);
        assert_eq!(Score::parse_quarter("."), None);
        assert_eq!(Score::parse_quarter("1.2.3"), None);
        assert_eq!(Score::parse_quarter("1e"), None);
        assert_eq!(Score::parse_quarter("e2"), None);
        assert_eq!(Score::parse_quarter("1e2.5"), None);
        assert_eq!(Score::parse_quarter("inf"), None);
    }

    #[test]
    fn parse_quarter_accepts_exponent() {
        assert_eq!(Score::parse_quarter("1e0"), Some(Score::MIN));
        assert_eq!(Score::parse_quarter("2.5E0"), Some(q(250)));
        assert_eq!(Score::parse_quarter("25e-1"), Some(q(250)));
        assert_eq!(Score::parse_quarter("0.0325e2"), Some(q(325)));
        assert_eq!(Score::parse_quarter("1e3"), Some(Score::MAX));
        assert_eq!(Score::parse_quarter("1e999999999999"), Some(Score::MAX));
        assert_eq!(Score::parse_quarter("5e-999999999999"), Some(Score::MIN));
        // 2.125 after the shift, half to even
        assert_eq!(Score::parse_quarter("2125e-3"), Some(q(212)));
    }

    #[test]
    fn mean_rounds_half_to_even() {
        assert_eq!(Score::mean(0, 0), Score::ZERO);
        assert_eq!(Score::mean(1000, 4), q(250));
        // 250.25 -> 250, 250.75 -> 251, 250.5 -> 250, 251.5 -> 252
        assert_eq!(Score::mean(1001, 4), q(250));
        assert_eq!(Score::mean(1003, 4), q(251));
        assert_eq!(Score::mean(1002, 4), q(250));
        assert_eq!(Score::mean(1006, 4), q(252));
    }

    #[test]
    fn grade_average_is_mean_of_quarters() {
        let grade = GradeRecord::new([q(100), q(200), q(300), q(400)]);
        assert_eq!(grade.average(), q(250));
    }

    #[test]
    fn grade_average_five_override() {
        let grade = GradeRecord::new([q(100), q(100), q(100), q(500)]);
        assert!(grade.has_max_quarter());
        assert_eq!(grade.average(), Score::MAX);
    }

    #[test]
    fn grade_record_clamps_quarters() {
        let grade = GradeRecord::new([q(0), q(50), q(450), q(900)]);
        assert_eq!(grade.quarters, [Score::MIN, Score::MIN, q(450), Score::MAX]);
    }

    #[test]
    fn score_json_roundtrip() {
        let json = serde_json::to_string(&q(425)).expect("serialize");
        assert_eq!(json, "4.25");
        let back: Score = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, q(425));
        let int: Score = serde_json::from_str("3").expect("deserialize int");
        assert_eq!(int, q(300));
    }

    #[test]
    fn score_json_saturates_large_values() {
        let big: Score = serde_json::from_str("700").expect("deserialize");
        assert_eq!(big, Score::from_hundredths(u16::MAX));
        let huge: Score = serde_json::from_str("1e300").expect("deserialize");
        assert_eq!(huge, Score::from_hundredths(u16::MAX));
        let text: Score = serde_json::from_str("\"1e6\"").expect("deserialize");
        assert_eq!(text, Score::from_hundredths(u16::MAX));
    }

    #[test]
    fn score_json_rejects_negative() {
        assert!(serde_json::from_str::<Score>("-1.0").is_err());
        assert!(serde_json::from_str::<Score>("\"abc\"").is_err());
    }

    #[test]
    fn new_student_has_all_default_subjects() {
        let student = NewStudent::new("Ana");
        assert_eq!(student.grades.len(), SUBJECTS.len());
        assert!(student.grades.values().all(|g| *g == GradeRecord::default()));
    }

    #[test]
    fn validate_rejects_empty_name() {
        let result = NewStudent::new("   ").validate();
        assert!(matches!(result, Err(GradebookError::EmptyName)));
    }

    #[test]
    fn validate_normalizes_optional_fields() {
        let student = NewStudent::new("  Ana  ")
            .lrn("")
            .nickname(" Annie ")
            .validate()
            .expect("valid");
        assert_eq!(student.name, "Ana");
        assert_eq!(student.lrn, None);
        assert_eq!(student.nickname.as_deref(), Some("Annie"));
    }

    #[test]
    fn validate_rejects_long_lrn() {
        let result = NewStudent::new("Ana").lrn("1".repeat(MAX_LRN_LENGTH + 1)).validate();
        assert!(matches!(result, Err(GradebookError::InvalidField(_))));
    }

    #[test]
    fn update_ignores_unknown_subjects() {
        let mut record = NewStudent::with_grades("Ana", BTreeMap::new())
            .grade("Math 2", GradeRecord::default())
            .into_record(StudentId(1), NaiveDateTime::default());

        let mut grades = BTreeMap::new();
        grades.insert(Subject::new("Math 2"), GradeRecord::new([q(200); 4]));
        grades.insert(Subject::new("Latin"), GradeRecord::new([q(200); 4]));
        let update = StudentUpdate {
            grades,
            ..StudentUpdate::default()
        };
        update.apply_to(&mut record).expect("apply");

        assert_eq!(record.grades.len(), 1);
        assert_eq!(record.grades[&Subject::new("Math 2")].average(), q(200));
    }

    #[test]
    fn rejected_update_leaves_record_untouched() {
        let mut record = NewStudent::new("Ana").into_record(StudentId(1), NaiveDateTime::default());
        let before = record.clone();
        let update = StudentUpdate {
            name: Some(String::new()),
            nickname: Some("Changed".to_string()),
            ..StudentUpdate::default()
        };
        assert!(matches!(
            update.apply_to(&mut record),
            Err(GradebookError::EmptyName)
        ));
        assert_eq!(record, before);
    }
}
