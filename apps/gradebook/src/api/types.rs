//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use gradebook_core::primitives::{QUARTERS, SUBJECTS};
use gradebook_core::{
    Extreme, GradeStatus, Score, StudentRecord, StudentView, Subject, compute_student_stats,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Gradebook status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub student_count: usize,
    pub subject_count: usize,
    pub backend: String,
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Body of every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: msg.into(),
        }
    }
}

// =============================================================================
// INDEX (STUDENT LIST)
// =============================================================================

/// Query string of `GET /`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexQuery {
    #[serde(default)]
    pub subject: Option<String>,
}

impl IndexQuery {
    /// The filter subject; an empty value means no filter.
    pub fn filter(&self) -> Option<Subject> {
        self.subject
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Subject::new)
    }
}

/// Quarters and average of the filter subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectGrade {
    pub subject: Subject,
    pub quarters: [Score; QUARTERS],
    pub average: Score,
}

/// One row of the student list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentSummary {
    pub id: u64,
    pub name: String,
    pub lrn: Option<String>,
    pub nickname: Option<String>,
    pub overall_average: Score,
    pub status: GradeStatus,
    pub status_label: String,
    pub highest: Option<Extreme>,
    pub lowest: Option<Extreme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_grade: Option<SubjectGrade>,
}

impl StudentSummary {
    /// Summarize a record, including the filter subject's grade if given.
    pub fn from_record(record: &StudentRecord, filter: Option<&Subject>) -> Self {
        let stats = compute_student_stats(&record.grades);
        let status = GradeStatus::classify(stats.overall_average);
        let subject_grade = filter.and_then(|subject| {
            record.grades.get(subject).map(|grade| SubjectGrade {
                subject: subject.clone(),
                quarters: grade.quarters,
                average: grade.average(),
            })
        });

        Self {
            id: record.id.0,
            name: record.name.clone(),
            lrn: record.lrn.clone(),
            nickname: record.nickname.clone(),
            overall_average: stats.overall_average,
            status,
            status_label: status.label().to_string(),
            highest: stats.highest,
            lowest: stats.lowest,
            subject_grade,
        }
    }
}

/// Response of `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexResponse {
    /// Every subject present in the store, sorted.
    pub subjects: Vec<Subject>,
    pub selected_subject: Option<Subject>,
    pub students: Vec<StudentSummary>,
}

// =============================================================================
// FORMS
// =============================================================================

/// What an add or edit form needs to render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormDescriptor {
    pub subjects: Vec<String>,
    pub quarters: usize,
    pub default_score: Score,
}

impl Default for FormDescriptor {
    fn default() -> Self {
        Self {
            subjects: SUBJECTS.iter().map(|s| (*s).to_string()).collect(),
            quarters: QUARTERS,
            default_score: Score::DEFAULT,
        }
    }
}

/// Response of `GET /edit/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditFormResponse {
    pub form: FormDescriptor,
    pub student: StudentRecord,
}

// =============================================================================
// STUDENT RESPONSES
// =============================================================================

/// A created, updated, or imported student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentResponse {
    pub success: bool,
    pub student: StudentRecord,
}

impl StudentResponse {
    pub fn success(student: StudentRecord) -> Self {
        Self {
            success: true,
            student,
        }
    }
}

/// Response of `POST /delete_student/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub id: u64,
}

/// Response of `GET /view/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewResponse {
    pub student: StudentRecord,
    pub subject_averages: BTreeMap<Subject, Score>,
    pub highest: Option<Extreme>,
    pub lowest: Option<Extreme>,
    pub overall_average: Score,
    pub status: GradeStatus,
    pub status_label: String,
}

impl From<StudentView> for ViewResponse {
    fn from(view: StudentView) -> Self {
        Self {
            student: view.record,
            subject_averages: view.subject_averages,
            highest: view.stats.highest,
            lowest: view.stats.lowest,
            overall_average: view.stats.overall_average,
            status: view.status,
            status_label: view.status.label().to_string(),
        }
    }
}
