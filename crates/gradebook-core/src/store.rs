//! # Record Store
//!
//! The `StudentStore` trait and its in-memory implementation, `Roster`.
//!
//! All data structures use `BTreeMap` for deterministic ordering.

use crate::{GradebookError, NewStudent, StudentId, StudentRecord, StudentUpdate, Subject};
use chrono::Local;
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// STUDENTSTORE TRAIT
// =============================================================================

/// Operations every student storage backend provides.
///
/// All fallible operations return `Result<T, GradebookError>` so the
/// in-memory and persistent backends can be used uniformly.
pub trait StudentStore {
    /// Validate and insert a new student. Assigns the next identifier.
    ///
    /// Fails with `GradebookError::EmptyName` if the name is empty; nothing
    /// is stored in that case.
    fn create(&mut self, student: NewStudent) -> Result<StudentRecord, GradebookError>;

    /// Fetch a student by identifier.
    fn read(&self, id: StudentId) -> Result<Option<StudentRecord>, GradebookError>;

    /// Apply a partial update and return the updated record.
    fn update(
        &mut self,
        id: StudentId,
        update: StudentUpdate,
    ) -> Result<StudentRecord, GradebookError>;

    /// Remove a student together with all of its grades.
    ///
    /// Returns whether a record was removed. Backends differ on unknown
    /// identifiers: see the implementation docs.
    fn delete(&mut self, id: StudentId) -> Result<bool, GradebookError>;

    /// All students. With a subject filter, only students holding a grade
    /// for it, ordered by name; otherwise identifier order.
    fn list(&self, subject: Option<&Subject>) -> Result<Vec<StudentRecord>, GradebookError>;

    /// Distinct subject names across all stored grades.
    fn subjects(&self) -> Result<BTreeSet<Subject>, GradebookError>;

    /// Number of stored students.
    fn count(&self) -> Result<usize, GradebookError>;
}

/// Order a subject-filtered listing by name, then identifier.
pub(crate) fn sort_by_name(students: &mut [StudentRecord]) {
    students.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
}

// =============================================================================
// ROSTER (IN-MEMORY)
// =============================================================================

/// In-memory student store.
///
/// Owns its identifier counter; identifiers are only handed out by
/// `create`. Deleting an unknown identifier is a no-op.
#[derive(Debug, Clone)]
pub struct Roster {
    students: BTreeMap<StudentId, StudentRecord>,
    next_id: u64,
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            students: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl Roster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier the next `create` will assign.
    #[must_use]
    pub fn next_id(&self) -> StudentId {
        StudentId(self.next_id)
    }
}

impl StudentStore for Roster {
    fn create(&mut self, student: NewStudent) -> Result<StudentRecord, GradebookError> {
        let student = student.validate()?;

        let id = StudentId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);

        let record = student.into_record(id, Local::now().naive_local());
        self.students.insert(id, record.clone());
        Ok(record)
    }

    fn read(&self, id: StudentId) -> Result<Option<StudentRecord>, GradebookError> {
        Ok(self.students.get(&id).cloned())
    }

    fn update(
        &mut self,
        id: StudentId,
        update: StudentUpdate,
    ) -> Result<StudentRecord, GradebookError> {
        let record = self
            .students
            .get_mut(&id)
            .ok_or(GradebookError::StudentNotFound(id))?;
        update.apply_to(record)?;
        Ok(record.clone())
    }

    fn delete(&mut self, id: StudentId) -> Result<bool, GradebookError> {
        Ok(self.students.remove(&id).is_some())
    }

    fn list(&self, subject: Option<&Subject>) -> Result<Vec<StudentRecord>, GradebookError> {
        match subject {
            Some(subject) => {
                let mut students: Vec<StudentRecord> = self
                    .students
                    .values()
                    .filter(|s| s.has_subject(subject))
                    .cloned()
                    .collect();
                sort_by_name(&mut students);
                Ok(students)
            }
            None => Ok(self.students.values().cloned().collect()),
        }
    }

    fn subjects(&self) -> Result<BTreeSet<Subject>, GradebookError> {
        Ok(self
            .students
            .values()
            .flat_map(|s| s.grades.keys().cloned())
            .collect())
    }

    fn count(&self) -> Result<usize, GradebookError> {
        Ok(self.students.len())
    }
}

// =============================================================================
// TESTS
// =============================================================================
