//! # Status Classifier
//!
//! Maps an average to one of six mutually exclusive standing labels.
//!
//! | Average            | Status          |
//! |--------------------|-----------------|
//! | == 1.00            | `HighestDl`     |
//! | (1.00, 1.50]       | `Dl`            |
//! | (1.50, 2.50]       | `Normal`        |
//! | (2.50, 2.75]       | `Probationary`  |
//! | (2.75, 3.00]       | `Removed`       |
//! | otherwise          | `NotTaken`      |
//!
//! Averages below 1.00 (including the 0.00 of a student without subjects)
//! land in the fallback together with averages above 3.00.

use crate::Score;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Academic standing derived from an average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeStatus {
    HighestDl,
    Dl,
    Normal,
    Probationary,
    Removed,
    NotTaken,
}

impl GradeStatus {
    /// Classify an average.
    #[must_use]
    pub fn classify(average: Score) -> Self {
        match average.hundredths() {
            100 => Self::HighestDl,
            101..=150 => Self::Dl,
            151..=250 => Self::Normal,
            251..=275 => Self::Probationary,
            276..=300 => Self::Removed,
            _ => Self::NotTaken,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::HighestDl => "Highest DL",
            Self::Dl => "DL",
            Self::Normal => "Normal",
            Self::Probationary => "Probationary",
            Self::Removed => "Student removed from the system",
            Self::NotTaken => "Student did not take the subject",
        }
    }
}

impl fmt::Display for GradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify an average and return its label.
#[must_use]
pub fn grade_status(average: Score) -> &'static str {
    GradeStatus::classify(average).label()
}
