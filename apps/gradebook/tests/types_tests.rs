//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use gradebook::api::{
    DeleteResponse, ErrorResponse, FormDescriptor, HealthResponse, IndexQuery, StatusResponse,
    StudentSummary, ViewResponse,
};
use gradebook_core::{
    GradeRecord, GradeStatus, NewStudent, Score, StudentId, StudentView, Subject,
};
use std::collections::BTreeMap;

fn record_with(grades: &[(&str, [u16; 4])]) -> gradebook_core::StudentRecord {
    let grades: BTreeMap<Subject, GradeRecord> = grades
        .iter()
        .map(|(s, q)| (Subject::new(*s), GradeRecord::new(q.map(Score::from_hundredths))))
        .collect();
    NewStudent::with_grades("Ana", grades)
        .lrn("1001")
        .into_record(StudentId(3), chrono_epoch())
}

fn chrono_epoch() -> chrono::NaiveDateTime {
    chrono::DateTime::from_timestamp(0, 0).unwrap().naive_utc()
}

// =============================================================================
// HEALTH / STATUS / ERROR TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_deserialization() {
    let json = r#"{"status":"healthy","version":"1.0.0"}"#;
    let health: HealthResponse = serde_json::from_str(json).unwrap();

    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, "1.0.0");
}

#[test]
fn test_status_response_serialization() {
    let status = StatusResponse {
        student_count: 4,
        subject_count: 12,
        backend: "redb".to_string(),
    };

    let json = serde_json::to_string(&status).unwrap();
    assert!(json.contains("\"student_count\":4"));
    assert!(json.contains("\"backend\":\"redb\""));
}

#[test]
fn test_error_response_new() {
    let error = ErrorResponse::new("Student not found: 4");
    assert!(!error.success);

    let json = serde_json::to_string(&error).unwrap();
    assert_eq!(json, r#"{"success":false,"error":"Student not found: 4"}"#);
}

#[test]
fn test_delete_response_round_trip() {
    let json = r#"{"success":true,"id":9}"#;
    let delete: DeleteResponse = serde_json::from_str(json).unwrap();
    assert!(delete.success);
    assert_eq!(delete.id, 9);
}

// =============================================================================
// INDEX QUERY TESTS
// =============================================================================

#[test]
fn test_index_query_filter() {
    let query: IndexQuery = serde_json::from_str(r#"{"subject":" PE "}"#).unwrap();
    assert_eq!(query.filter(), Some(Subject::new("PE")));

    let blank: IndexQuery = serde_json::from_str(r#"{"subject":""}"#).unwrap();
    assert_eq!(blank.filter(), None);

    let missing: IndexQuery = serde_json::from_str("{}").unwrap();
    assert_eq!(missing.filter(), None);
}

// =============================================================================
// SUMMARY / VIEW TESTS
// =============================================================================

#[test]
fn test_summary_without_filter() {
    let record = record_with(&[("PE", [150, 150, 150, 150]), ("ES", [200, 200, 200, 200])]);

    let summary = StudentSummary::from_record(&record, None);

    assert_eq!(summary.id, 3);
    assert_eq!(summary.lrn.as_deref(), Some("1001"));
    assert_eq!(summary.overall_average, Score::from_hundredths(175));
    assert_eq!(summary.status, GradeStatus::Normal);
    assert_eq!(summary.status_label, "Normal");
    assert!(summary.subject_grade.is_none());

    let json = serde_json::to_value(&summary).unwrap();
    assert!(json.get("subject_grade").is_none());
    assert_eq!(json["status"], "normal");
    assert_eq!(json["overall_average"], 1.75);
}

#[test]
fn test_summary_with_filter() {
    let record = record_with(&[("PE", [100, 125, 150, 175])]);
    let pe = Subject::new("PE");

    let summary = StudentSummary::from_record(&record, Some(&pe));

    let grade = summary.subject_grade.unwrap();
    assert_eq!(grade.subject, pe);
    // (1.00 + 1.25 + 1.50 + 1.75) / 4 = 1.375, half-to-even gives 1.38
    assert_eq!(grade.average, Score::from_hundredths(138));
}

#[test]
fn test_summary_with_missing_filter_subject() {
    let record = record_with(&[("PE", [100, 100, 100, 100])]);

    let summary = StudentSummary::from_record(&record, Some(&Subject::new("Latin")));

    assert!(summary.subject_grade.is_none());
}

#[test]
fn test_view_response_from_view() {
    let record = record_with(&[("PE", [300, 300, 300, 300]), ("ES", [250, 250, 250, 250])]);

    let view: ViewResponse = StudentView::from_record(record).into();

    assert_eq!(view.overall_average, Score::from_hundredths(275));
    assert_eq!(view.status, GradeStatus::Probationary);
    assert_eq!(view.status_label, "Probationary");
    assert_eq!(view.subject_averages.len(), 2);
    assert_eq!(
        view.highest.unwrap().subjects,
        vec![Subject::new("PE")]
    );
}

#[test]
fn test_form_descriptor_default() {
    let form = FormDescriptor::default();
    assert_eq!(form.subjects.first().map(String::as_str), Some("Math 2"));
    assert_eq!(form.subjects.len(), 12);

    let json = serde_json::to_value(&form).unwrap();
    assert_eq!(json["default_score"], 5.0);
}
