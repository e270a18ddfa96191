//! # gradebook-core
//!
//! The grade-tracking engine - THE LOGIC.
//!
//! This crate holds student records with four quarterly scores per subject,
//! derives averages, extremes, and academic standing from them, and stores
//! them either in memory or in a single redb file.
//!
//! ## Architectural Constraints
//!
//! - Pure Rust: NO async, NO network dependencies
//! - Deterministic: `BTreeMap` everywhere, integer fixed-point scores
//! - Never panics: every failure is a `GradebookError`
//! - No logging: the app layer traces what it needs

// =============================================================================
// MODULES
// =============================================================================

pub mod export;
pub mod form;
pub mod gradebook;
pub mod primitives;
pub mod stats;
pub mod status;
pub mod storage;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    GradeRecord, GradebookError, NewStudent, Score, StudentId, StudentRecord, StudentUpdate,
    Subject, default_grades,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use export::{StudentDocument, export_document, import_document, to_json_bytes};
pub use form::{
    FormFields, coerce_quarters, new_student_from_form, parse_grade_assignment, quarter_field,
    update_from_form,
};
pub use gradebook::{Gradebook, StorageBackend, StudentView};
pub use stats::{Extreme, StudentStats, compute_student_stats};
pub use status::{GradeStatus, grade_status};
pub use storage::RedbStore;
pub use store::{Roster, StudentStore};
