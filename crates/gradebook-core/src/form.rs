//! # Form Input Coercion
//!
//! Turns loosely typed form fields into grade records.
//!
//! Quarter inputs are read from fields named `{subject}_q1` .. `{subject}_q4`.
//! The policy is permissive:
//! - a missing quarter field defaults to 5.00
//! - if any present quarter of a subject fails to parse, all four quarters
//!   of that subject become 5.00
//! - parsed values are rounded to two decimals and clamped to `[1.00, 5.00]`

use crate::primitives::{QUARTERS, SUBJECTS};
use crate::{GradeRecord, GradebookError, NewStudent, Score, StudentRecord, StudentUpdate, Subject};
use std::collections::BTreeMap;

/// Raw form fields, keyed by field name.
pub type FormFields = BTreeMap<String, String>;

/// Name of the form field holding quarter `quarter` (1-based) of `subject`.
#[must_use]
pub fn quarter_field(subject: &str, quarter: usize) -> String {
    format!("{}_q{}", subject, quarter)
}

/// Coerce four optional quarter inputs into a grade record.
#[must_use]
pub fn coerce_quarters(inputs: [Option<&str>; QUARTERS]) -> GradeRecord {
    let mut quarters = [Score::DEFAULT; QUARTERS];
    for (slot, input) in quarters.iter_mut().zip(inputs) {
        if let Some(raw) = input {
            match Score::parse_quarter(raw) {
                Some(score) => *slot = score,
                None => return GradeRecord::default(),
            }
        }
    }
    GradeRecord::new(quarters)
}

/// Read the four quarter inputs of `subject` from the form.
fn subject_inputs<'a>(fields: &'a FormFields, subject: &str) -> [Option<&'a str>; QUARTERS] {
    std::array::from_fn(|i| fields.get(&quarter_field(subject, i + 1)).map(String::as_str))
}

/// Build a new student from an add form: identity fields plus one grade per
/// subject in `SUBJECTS`.
///
/// The name is not validated here; the store rejects an empty one.
#[must_use]
pub fn new_student_from_form(fields: &FormFields) -> NewStudent {
    let grades = SUBJECTS
        .iter()
        .map(|s| (Subject::new(*s), coerce_quarters(subject_inputs(fields, s))))
        .collect();

    NewStudent {
        name: fields.get("name").cloned().unwrap_or_default(),
        lrn: fields.get("lrn").cloned(),
        nickname: fields.get("nickname").cloned(),
        grades,
    }
}

/// Build an update from an edit form for an existing record.
///
/// Only subjects the record already has are considered, and only those
/// with at least one quarter field present in the form.
#[must_use]
pub fn update_from_form(fields: &FormFields, record: &StudentRecord) -> StudentUpdate {
    let grades = record
        .grades
        .keys()
        .filter_map(|subject| {
            let inputs = subject_inputs(fields, subject.as_str());
            inputs
                .iter()
                .any(Option::is_some)
                .then(|| (subject.clone(), coerce_quarters(inputs)))
        })
        .collect();

    StudentUpdate {
        name: fields.get("name").cloned(),
        lrn: fields.get("lrn").cloned(),
        nickname: fields.get("nickname").cloned(),
        grades,
    }
}

/// Parse a `Subject=q1,q2,q3,q4` assignment (as given on the command line).
///
/// The shape must be right; the quarter values themselves are coerced with
/// the same permissive policy as form input.
pub fn parse_grade_assignment(input: &str) -> Result<(Subject, GradeRecord), GradebookError> {
    let (subject, values) = input.split_once('=').ok_or_else(|| {
        GradebookError::InvalidField(format!("expected Subject=q1,q2,q3,q4, got '{}'", input))
    })?;
    let subject = Subject::new(subject.trim());
    subject.validate()?;

    let parts: Vec<&str> = values.split(',').collect();
    if parts.len() != QUARTERS {
        return Err(GradebookError::InvalidField(format!(
            "expected {} quarter values for {}, got {}",
            QUARTERS,
            subject,
            parts.len()
        )));
    }
    let inputs = std::array::from_fn(|i| parts.get(i).copied());
    Ok((subject, coerce_quarters(inputs)))
}

// =============================================================================
// TESTS
// =============================================================================
