//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Reads take the gradebook read lock; mutations take the write lock and
//! hold it for the whole read-modify-write.

use super::{
    AppState,
    types::{
        DeleteResponse, EditFormResponse, ErrorResponse, FormDescriptor, HealthResponse,
        IndexQuery, IndexResponse, StatusResponse, StudentResponse, StudentSummary, ViewResponse,
    },
};
use crate::bundle::{BUNDLE_FILE_NAME, bundle_source};
use axum::{
    Json,
    extract::{Form, Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use gradebook_core::{
    FormFields, GradebookError, StudentId, new_student_from_form, to_json_bytes,
    update_from_form,
};

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// HTTP status for a core error.
pub fn status_for(error: &GradebookError) -> StatusCode {
    match error {
        GradebookError::EmptyName
        | GradebookError::InvalidField(_)
        | GradebookError::InvalidDocument(_) => StatusCode::BAD_REQUEST,
        GradebookError::StudentNotFound(_) => StatusCode::NOT_FOUND,
        GradebookError::SerializationError(_) | GradebookError::IoError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(error: &GradebookError) -> Response {
    let status = status_for(error);
    if status.is_server_error() {
        tracing::error!("Request failed: {}", error);
    }
    (status, Json(ErrorResponse::new(error.to_string()))).into_response()
}

// =============================================================================
// HEALTH / STATUS HANDLERS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Gradebook status.
pub async fn status_handler(State(state): State<AppState>) -> Response {
    let book = state.gradebook.read().await;

    let counts = book
        .count()
        .and_then(|students| Ok((students, book.subjects()?.len())));
    match counts {
        Ok((student_count, subject_count)) => (
            StatusCode::OK,
            Json(StatusResponse {
                student_count,
                subject_count,
                backend: book.backend_name().to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// INDEX HANDLER
// =============================================================================

/// List students with summaries, optionally filtered by subject.
pub async fn index_handler(
    State(state): State<AppState>,
    Query(query): Query<IndexQuery>,
) -> Response {
    let filter = query.filter();
    let book = state.gradebook.read().await;

    let listing = book
        .list(filter.as_ref())
        .and_then(|students| Ok((students, book.subjects()?)));
    match listing {
        Ok((students, subjects)) => {
            let summaries = students
                .iter()
                .map(|s| StudentSummary::from_record(s, filter.as_ref()))
                .collect();
            let response = IndexResponse {
                subjects: subjects.into_iter().collect(),
                selected_subject: filter,
                students: summaries,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// ADD HANDLERS
// =============================================================================

/// Descriptor of the add form.
pub async fn add_form_handler() -> impl IntoResponse {
    Json(FormDescriptor::default())
}

/// Create a student from form fields.
pub async fn add_student_handler(
    State(state): State<AppState>,
    Form(fields): Form<FormFields>,
) -> Response {
    let student = new_student_from_form(&fields);

    let mut book = state.gradebook.write().await;
    match book.create(student) {
        Ok(record) => {
            tracing::info!(student_id = %record.id, name = %record.name, "student_created");
            (StatusCode::CREATED, Json(StudentResponse::success(record))).into_response()
        }
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// VIEW HANDLER
// =============================================================================

/// One student with derived statistics.
pub async fn view_handler(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let id = StudentId(id);
    let book = state.gradebook.read().await;

    match book.view(id) {
        Ok(Some(view)) => (StatusCode::OK, Json(ViewResponse::from(view))).into_response(),
        Ok(None) => error_response(&GradebookError::StudentNotFound(id)),
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// EDIT HANDLERS
// =============================================================================

/// Descriptor of the edit form plus the current record.
pub async fn edit_form_handler(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let book = state.gradebook.read().await;

    match book.get(StudentId(id)) {
        Ok(student) => (
            StatusCode::OK,
            Json(EditFormResponse {
                form: FormDescriptor::default(),
                student,
            }),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

/// Apply an edit form to an existing student.
pub async fn edit_student_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Form(fields): Form<FormFields>,
) -> Response {
    let id = StudentId(id);
    let mut book = state.gradebook.write().await;

    let result = book
        .get(id)
        .and_then(|record| book.update(id, update_from_form(&fields, &record)));
    match result {
        Ok(record) => {
            tracing::info!(student_id = %record.id, "student_updated");
            (StatusCode::OK, Json(StudentResponse::success(record))).into_response()
        }
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// DELETE HANDLER
// =============================================================================

/// Delete a student and its grades.
pub async fn delete_handler(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let id = StudentId(id);
    let mut book = state.gradebook.write().await;

    match book.delete(id) {
        Ok(true) => {
            tracing::info!(student_id = %id, "student_deleted");
            (
                StatusCode::OK,
                Json(DeleteResponse {
                    success: true,
                    id: id.0,
                }),
            )
                .into_response()
        }
        // The in-memory backend reports absence as `false`.
        Ok(false) => error_response(&GradebookError::StudentNotFound(id)),
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// EXPORT / IMPORT HANDLERS
// =============================================================================

/// Download one student as a JSON document.
pub async fn export_handler(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let book = state.gradebook.read().await;

    match book.export(StudentId(id)).and_then(|doc| to_json_bytes(&doc)) {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/json".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"student_{}.json\"", id),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

/// Insert a student from an uploaded JSON document (multipart part `file`).
pub async fn import_handler(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut upload = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => match field.bytes().await {
                Ok(bytes) => {
                    upload = Some(bytes);
                    break;
                }
                Err(e) => {
                    return error_response(&GradebookError::InvalidDocument(e.to_string()));
                }
            },
            Ok(Some(_)) => {}
            Ok(None) => break,
            Err(e) => return error_response(&GradebookError::InvalidDocument(e.to_string())),
        }
    }

    let Some(bytes) = upload else {
        return error_response(&GradebookError::InvalidDocument(
            "No file uploaded".to_string(),
        ));
    };

    let mut book = state.gradebook.write().await;
    match book.import(&bytes) {
        Ok(record) => {
            tracing::info!(student_id = %record.id, name = %record.name, "student_imported");
            (StatusCode::CREATED, Json(StudentResponse::success(record))).into_response()
        }
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// SOURCE DOWNLOAD HANDLER
// =============================================================================

/// Download the application source tree as a ZIP archive.
pub async fn download_source_handler(State(state): State<AppState>) -> Response {
    let root = state.settings.source_dir.clone();

    let bundled = tokio::task::spawn_blocking(move || bundle_source(&root))
        .await
        .map_err(|e| GradebookError::IoError(format!("Bundle task failed: {}", e)))
        .and_then(|result| result);

    match bundled {
        Ok(data) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/zip".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", BUNDLE_FILE_NAME),
                ),
            ],
            data,
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}
