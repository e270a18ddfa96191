//! # Gradebook
//!
//! The facade the application talks to: one storage backend plus the
//! derived views built on top of it.
//!
//! ## Storage Backends
//!
//! - `InMemory`: a `Roster` (fast, volatile)
//! - `Persistent`: a `RedbStore` (single-file, ACID)

use crate::export::{StudentDocument, export_document, import_document};
use crate::stats::{StudentStats, compute_student_stats};
use crate::status::GradeStatus;
use crate::storage::RedbStore;
use crate::store::{Roster, StudentStore};
use crate::{
    GradebookError, NewStudent, Score, StudentId, StudentRecord, StudentUpdate, Subject,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Storage backend of a `Gradebook`.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory roster (fast, volatile).
    InMemory(Roster),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(Roster::new())
    }
}

/// A student together with everything derived from its grades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentView {
    pub record: StudentRecord,
    /// Average of every subject, keyed like `record.grades`.
    pub subject_averages: BTreeMap<Subject, Score>,
    pub stats: StudentStats,
    /// Standing derived from the overall average.
    pub status: GradeStatus,
}

impl StudentView {
    /// Derive the view of a record.
    #[must_use]
    pub fn from_record(record: StudentRecord) -> Self {
        let subject_averages = record
            .grades
            .iter()
            .map(|(subject, grade)| (subject.clone(), grade.average()))
            .collect();
        let stats = compute_student_stats(&record.grades);
        let status = GradeStatus::classify(stats.overall_average);
        Self {
            record,
            subject_averages,
            stats,
            status,
        }
    }
}

/// Student records behind a selectable storage backend.
///
/// Note: `Gradebook` does NOT implement Clone; the redb handle cannot be
/// shared that way. Wrap it in `Arc<RwLock<_>>` to share.
#[derive(Debug, Default)]
pub struct Gradebook {
    backend: StorageBackend,
}

impl Gradebook {
    /// Create an empty in-memory gradebook.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a gradebook over an existing roster.
    #[must_use]
    pub fn with_roster(roster: Roster) -> Self {
        Self {
            backend: StorageBackend::InMemory(roster),
        }
    }

    /// Open or create a redb database at the given path.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, GradebookError> {
        Ok(Self {
            backend: StorageBackend::Persistent(RedbStore::open(path)?),
        })
    }

    /// Check whether records survive a restart.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    /// Short backend name for status output.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            StorageBackend::InMemory(_) => "memory",
            StorageBackend::Persistent(_) => "redb",
        }
    }

    fn store(&self) -> &dyn StudentStore {
        match &self.backend {
            StorageBackend::InMemory(roster) => roster,
            StorageBackend::Persistent(redb) => redb,
        }
    }

    fn store_mut(&mut self) -> &mut dyn StudentStore {
        match &mut self.backend {
            StorageBackend::InMemory(roster) => roster,
            StorageBackend::Persistent(redb) => redb,
        }
    }

    // =========================================================================
    // RECORD OPERATIONS
    // =========================================================================

    /// Validate and insert a new student.
    pub fn create(&mut self, student: NewStudent) -> Result<StudentRecord, GradebookError> {
        self.store_mut().create(student)
    }

    /// Fetch a student by identifier.
    pub fn read(&self, id: StudentId) -> Result<Option<StudentRecord>, GradebookError> {
        self.store().read(id)
    }

    /// Fetch a student, treating absence as an error.
    pub fn get(&self, id: StudentId) -> Result<StudentRecord, GradebookError> {
        self.read(id)?.ok_or(GradebookError::StudentNotFound(id))
    }

    /// Apply a partial update.
    pub fn update(
        &mut self,
        id: StudentId,
        update: StudentUpdate,
    ) -> Result<StudentRecord, GradebookError> {
        self.store_mut().update(id, update)
    }

    /// Delete a student and its grades.
    ///
    /// The in-memory backend reports an unknown id as `Ok(false)`; the redb
    /// backend as `StudentNotFound`.
    pub fn delete(&mut self, id: StudentId) -> Result<bool, GradebookError> {
        self.store_mut().delete(id)
    }

    /// List students, optionally only those graded in `subject`.
    pub fn list(&self, subject: Option<&Subject>) -> Result<Vec<StudentRecord>, GradebookError> {
        self.store().list(subject)
    }

    /// Distinct subject names across all students.
    pub fn subjects(&self) -> Result<BTreeSet<Subject>, GradebookError> {
        self.store().subjects()
    }

    /// Number of students.
    pub fn count(&self) -> Result<usize, GradebookError> {
        self.store().count()
    }

    // =========================================================================
    // DERIVED VIEWS
    // =========================================================================

    /// A student with per-subject averages, statistics, and status.
    pub fn view(&self, id: StudentId) -> Result<Option<StudentView>, GradebookError> {
        Ok(self.read(id)?.map(StudentView::from_record))
    }

    /// The export document of one student.
    pub fn export(&self, id: StudentId) -> Result<StudentDocument, GradebookError> {
        Ok(export_document(&self.get(id)?))
    }

    /// Insert a student from an uploaded document under a new identifier.
    pub fn import(&mut self, bytes: &[u8]) -> Result<StudentRecord, GradebookError> {
        let student = import_document(bytes)?;
        self.create(student)
    }
}
