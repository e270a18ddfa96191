//! # Student Document Export
//!
//! The JSON exchange format for a single student:
//!
//! ```json
//! {
//!   "id": 7,
//!   "name": "Ana Cruz",
//!   "lrn": "136512",
//!   "nickname": null,
//!   "grades": { "Math 2": [1.25, 1.5, 1.0, 1.75] }
//! }
//! ```
//!
//! Importing ignores `id` (the store assigns a new one) and requires `name`
//! and `grades`. Every subject must carry exactly four quarters; values are
//! clamped into `[1.00, 5.00]` on insert.

use crate::primitives::{MAX_DOCUMENT_SIZE, MAX_SUBJECTS_PER_STUDENT, QUARTERS};
use crate::{GradeRecord, GradebookError, NewStudent, Score, StudentRecord, Subject};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A student as exchanged through export and import.
///
/// All fields are optional at the type level so that a missing field
/// produces a precise `InvalidDocument` error instead of a generic parse
/// failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StudentDocument {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub lrn: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub grades: Option<BTreeMap<String, Vec<Score>>>,
}

/// Build the export document of a stored record.
#[must_use]
pub fn export_document(record: &StudentRecord) -> StudentDocument {
    let grades = record
        .grades
        .iter()
        .map(|(subject, grade)| (subject.as_str().to_string(), grade.quarters.to_vec()))
        .collect();

    StudentDocument {
        id: Some(record.id.0),
        name: Some(record.name.clone()),
        lrn: record.lrn.clone(),
        nickname: record.nickname.clone(),
        grades: Some(grades),
    }
}

/// Serialize a document as pretty-printed JSON.
pub fn to_json_bytes(document: &StudentDocument) -> Result<Vec<u8>, GradebookError> {
    serde_json::to_vec_pretty(document)
        .map_err(|e| GradebookError::SerializationError(e.to_string()))
}

/// Parse and check an uploaded document, producing a student to insert.
///
/// The name is passed through untouched; the store rejects an empty one.
///
/// # Errors
///
/// `InvalidDocument` if the payload is too large, not valid JSON, lacks
/// `name` or `grades`, has too many subjects, or a subject without exactly
/// four quarters.
pub fn import_document(bytes: &[u8]) -> Result<NewStudent, GradebookError> {
    if bytes.len() > MAX_DOCUMENT_SIZE {
        return Err(GradebookError::InvalidDocument(format!(
            "document exceeds {} bytes",
            MAX_DOCUMENT_SIZE
        )));
    }

    let document: StudentDocument = serde_json::from_slice(bytes)
        .map_err(|e| GradebookError::InvalidDocument(e.to_string()))?;

    let name = document
        .name
        .ok_or_else(|| GradebookError::InvalidDocument("missing field: name".to_string()))?;
    let raw_grades = document
        .grades
        .ok_or_else(|| GradebookError::InvalidDocument("missing field: grades".to_string()))?;

    if raw_grades.len() > MAX_SUBJECTS_PER_STUDENT {
        return Err(GradebookError::InvalidDocument(format!(
            "too many subjects: {} (max {})",
            raw_grades.len(),
            MAX_SUBJECTS_PER_STUDENT
        )));
    }

    let mut grades = BTreeMap::new();
    for (subject, values) in raw_grades {
        let quarters: [Score; QUARTERS] = values.try_into().map_err(|v: Vec<Score>| {
            GradebookError::InvalidDocument(format!(
                "subject '{}' has {} quarters, expected {}",
                subject,
                v.len(),
                QUARTERS
            ))
        })?;
        grades.insert(Subject::new(subject), GradeRecord::new(quarters));
    }

    Ok(NewStudent {
        name,
        lrn: document.lrn,
        nickname: document.nickname,
        grades,
    })
}
