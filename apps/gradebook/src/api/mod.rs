//! # Gradebook HTTP API Module
//!
//! This module implements the HTTP API server using axum. Responses are
//! JSON; form submissions are `application/x-www-form-urlencoded`.
//!
//! ## Endpoints
//!
//! - `GET /` - List students (`?subject=` filter)
//! - `GET /add_student` - Add form descriptor
//! - `POST /add_student` - Create a student
//! - `GET /view/{id}` - Student detail with statistics
//! - `GET /edit/{id}` - Edit form descriptor and current record
//! - `POST /edit/{id}` - Update a student
//! - `POST /delete_student/{id}` - Delete a student
//! - `GET /export_student/{id}` - Download a student document
//! - `POST /import_student` - Upload a student document (multipart `file`)
//! - `GET /download_source` - ZIP of the application source tree
//! - `GET /health` - Health check
//! - `GET /status` - Record counts and backend

mod handlers;
mod middleware;
mod types;

pub use middleware::{GlobalRateLimiter, create_rate_limiter};
// Re-export handlers and types for integration tests (via `gradebook::api::*`)
pub use handlers::status_for;
pub use types::{
    DeleteResponse, EditFormResponse, ErrorResponse, FormDescriptor, HealthResponse, IndexQuery,
    IndexResponse, StatusResponse, StudentResponse, StudentSummary, SubjectGrade, ViewResponse,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use gradebook_core::{Gradebook, GradebookError};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Request body limit.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Every registered route as `(method, path, description)`.
pub const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/", "List students (?subject=)"),
    ("GET", "/add_student", "Add form"),
    ("POST", "/add_student", "Create a student"),
    ("GET", "/view/{id}", "Student detail"),
    ("GET", "/edit/{id}", "Edit form"),
    ("POST", "/edit/{id}", "Update a student"),
    ("POST", "/delete_student/{id}", "Delete a student"),
    ("GET", "/export_student/{id}", "Export a student"),
    ("POST", "/import_student", "Import a student"),
    ("GET", "/download_source", "Source ZIP"),
    ("GET", "/health", "Health check"),
    ("GET", "/status", "Record counts"),
];

// =============================================================================
// SERVER STATE
// =============================================================================

/// HTTP-layer settings resolved from `Config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Root of the tree served by `/download_source`.
    pub source_dir: PathBuf,
    /// Requests per second; 0 disables rate limiting.
    pub rate_limit: u32,
    /// Comma-separated origins or `*`; `None` means localhost only.
    pub cors_origins: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            rate_limit: 100,
            cors_origins: None,
        }
    }
}

/// Shared server state containing the gradebook.
#[derive(Clone)]
pub struct AppState {
    /// The gradebook; writers are serialized by the lock.
    pub gradebook: Arc<RwLock<Gradebook>>,
    pub settings: Arc<ServerSettings>,
}

impl AppState {
    /// Create new app state with default settings.
    #[must_use]
    pub fn new(gradebook: Gradebook) -> Self {
        Self::with_settings(gradebook, ServerSettings::default())
    }

    #[must_use]
    pub fn with_settings(gradebook: Gradebook, settings: ServerSettings) -> Self {
        Self {
            gradebook: Arc::new(RwLock::new(gradebook)),
            settings: Arc::new(settings),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer.
///
/// - `"*"`: allows all origins (development only)
/// - `None`: localhost only
/// - otherwise: the comma-separated list of origins
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins.map(str::trim) {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE])
            }
        }
        None => build_localhost_cors(),
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting (if enabled)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(state.settings.cors_origins.as_deref());

    let rate_limit = state.settings.rate_limit;
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let mut router = Router::new()
        .route("/", get(handlers::index_handler))
        .route(
            "/add_student",
            get(handlers::add_form_handler).post(handlers::add_student_handler),
        )
        .route("/view/{id}", get(handlers::view_handler))
        .route(
            "/edit/{id}",
            get(handlers::edit_form_handler).post(handlers::edit_student_handler),
        )
        .route("/delete_student/{id}", post(handlers::delete_handler))
        .route("/export_student/{id}", get(handlers::export_handler))
        .route("/import_student", post(handlers::import_handler))
        .route("/download_source", get(handlers::download_source_handler))
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler));

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Resolve on Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Start the HTTP server.
pub async fn run_server(
    addr: &str,
    gradebook: Gradebook,
    settings: ServerSettings,
) -> Result<(), GradebookError> {
    let state = AppState::with_settings(gradebook, settings);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| GradebookError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Gradebook HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| GradebookError::IoError(format!("Server error: {}", e)))
}
