//! # Gradebook Primitives
//!
//! Fixed constants for the gradebook CORE: the subject list, score bounds,
//! and input validation limits. These are compiled into the binary and are
//! immutable at runtime.

/// The subjects every new student is enrolled in, in form order.
pub const SUBJECTS: [&str; 12] = [
    "Math 2", "Math 3", "ES", "SocSci", "English", "Filipino", "PE", "AdTech", "Physics",
    "Health", "Biology", "CS2",
];

/// Number of quarters in a school year.
pub const QUARTERS: usize = 4;

/// Lowest allowed quarter score, in hundredths (1.00).
pub const MIN_SCORE_HUNDREDTHS: u16 = 100;

/// Highest allowed quarter score, in hundredths (5.00).
///
/// A quarter at exactly this value also triggers the five-override rule
/// in the statistics engine.
pub const MAX_SCORE_HUNDREDTHS: u16 = 500;

/// Score assigned to quarters that were not supplied or failed to parse.
pub const DEFAULT_SCORE_HUNDREDTHS: u16 = 500;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length of a student name, in bytes.
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum length of a learner reference number, in bytes.
pub const MAX_LRN_LENGTH: usize = 20;

/// Maximum length of a nickname, in bytes.
pub const MAX_NICKNAME_LENGTH: usize = 50;

/// Maximum length of a subject name, in bytes.
pub const MAX_SUBJECT_LENGTH: usize = 50;

/// Maximum number of subjects a single student document may carry.
pub const MAX_SUBJECTS_PER_STUDENT: usize = 64;

/// Maximum size of an imported student document (1 MB).
///
/// Checked before the document is parsed.
pub const MAX_DOCUMENT_SIZE: usize = 1024 * 1024;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn twelve_distinct_subjects() {
        let unique: BTreeSet<_> = SUBJECTS.iter().collect();
        assert_eq!(unique.len(), 12);
    }

    #[test]
    fn default_score_is_within_bounds() {
        assert!((MIN_SCORE_HUNDREDTHS..=MAX_SCORE_HUNDREDTHS).contains(&DEFAULT_SCORE_HUNDREDTHS));
    }

    #[test]
    fn subject_names_fit_limit() {
        assert!(SUBJECTS.iter().all(|s| s.len() <= MAX_SUBJECT_LENGTH));
    }
}
