//! # Statistics Engine
//!
//! Aggregate figures over one student's grades: the highest and lowest
//! subject averages (with every tied subject) and the overall average.
//!
//! Pure functions of the grade map; nothing here touches storage.

use crate::{GradeRecord, Score, Subject};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An extreme subject average and every subject attaining it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extreme {
    /// Subjects sharing the score, in subject name order.
    pub subjects: Vec<Subject>,
    pub score: Score,
}

impl Extreme {
    fn new(subject: &Subject, score: Score) -> Self {
        Self {
            subjects: vec![subject.clone()],
            score,
        }
    }

    /// Fold one subject average into the extreme. `better` decides whether
    /// the candidate replaces the current score outright.
    fn offer(&mut self, subject: &Subject, score: Score, better: fn(Score, Score) -> bool) {
        if better(score, self.score) {
            self.score = score;
            self.subjects.clear();
            self.subjects.push(subject.clone());
        } else if score == self.score {
            self.subjects.push(subject.clone());
        }
    }
}

/// Statistics derived from a student's grades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentStats {
    /// `None` when the student has no subjects.
    pub highest: Option<Extreme>,
    /// `None` when the student has no subjects.
    pub lowest: Option<Extreme>,
    /// General weighted average (unweighted mean of subject averages).
    pub overall_average: Score,
}

/// Compute highest, lowest, and overall average for a grade map.
///
/// - Subject averages follow `GradeRecord::average` (including its
///   five-override).
/// - The overall average is the mean of subject averages rounded to two
///   decimals, except that any single quarter at 5.00 in any subject forces
///   it to 5.00.
/// - No subjects: both extremes are `None` and the overall average is 0.
#[must_use]
pub fn compute_student_stats(grades: &BTreeMap<Subject, GradeRecord>) -> StudentStats {
    let mut highest: Option<Extreme> = None;
    let mut lowest: Option<Extreme> = None;
    let mut total: u64 = 0;
    let mut count: u64 = 0;
    let mut any_max_quarter = false;

    for (subject, grade) in grades {
        let avg = grade.average();
        total += u64::from(avg.hundredths());
        count += 1;
        any_max_quarter |= grade.has_max_quarter();

        match highest.as_mut() {
            Some(h) => h.offer(subject, avg, |a, b| a > b),
            None => highest = Some(Extreme::new(subject, avg)),
        }
        match lowest.as_mut() {
            Some(l) => l.offer(subject, avg, |a, b| a < b),
            None => lowest = Some(Extreme::new(subject, avg)),
        }
    }

    let overall_average = if any_max_quarter {
        Score::MAX
    } else {
        Score::mean(total, count)
    };

    StudentStats {
        highest,
        lowest,
        overall_average,
    }
}

// =============================================================================
// TESTS
// =============================================================================
