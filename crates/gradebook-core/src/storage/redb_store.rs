//! # redb-backed Student Storage
//!
//! A single-file student store using the redb embedded database, providing
//! ACID transactions and crash safety without configuration.
//!
//! ## Layout
//!
//! - `students`: student id -> postcard-encoded identity row
//! - `grades`: (student id, ordinal) -> postcard-encoded (subject, quarters)
//! - `metadata`: `"next_student_id"` -> next identifier to assign
//!
//! Grade rows belong to exactly one student. Deleting a student removes
//! every grade row under its id in the same write transaction.
//!
//! Ordinals number a student's subjects in name order at creation. Updates
//! never add or remove subjects, so an ordinal stays bound to its subject
//! for the lifetime of the student.

use crate::store::{StudentStore, sort_by_name};
use crate::{
    GradeRecord, GradebookError, NewStudent, Score, StudentId, StudentRecord, StudentUpdate,
    Subject,
};
use chrono::{Local, NaiveDateTime};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Table for students: StudentId(u64) -> serialized `StudentRow`
const STUDENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("students");

/// Table for grades: (StudentId(u64), ordinal) -> serialized `GradeRow`
const GRADES: TableDefinition<(u64, u32), &[u8]> = TableDefinition::new("grades");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const NEXT_ID_KEY: &str = "next_student_id";

/// Identity columns of a student.
#[derive(Debug, Serialize, Deserialize)]
struct StudentRow {
    name: String,
    lrn: Option<String>,
    nickname: Option<String>,
    created_at: NaiveDateTime,
}

/// One subject's quarters, in hundredths.
#[derive(Debug, Serialize, Deserialize)]
struct GradeRow {
    subject: String,
    quarters: [u16; 4],
}

impl GradeRow {
    fn new(subject: &Subject, grade: &GradeRecord) -> Self {
        Self {
            subject: subject.as_str().to_string(),
            quarters: grade.quarters.map(Score::hundredths),
        }
    }

    fn into_pair(self) -> (Subject, GradeRecord) {
        (
            Subject(self.subject),
            GradeRecord {
                quarters: self.quarters.map(Score::from_hundredths),
            },
        )
    }
}

fn io_err(e: impl std::fmt::Display) -> GradebookError {
    GradebookError::IoError(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, GradebookError> {
    postcard::to_allocvec(value).map_err(|e| GradebookError::SerializationError(e.to_string()))
}

fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, GradebookError> {
    postcard::from_bytes(bytes).map_err(|e| GradebookError::SerializationError(e.to_string()))
}

/// Read every grade row of one student, keyed by ordinal.
fn load_grade_rows(
    table: &impl ReadableTable<(u64, u32), &'static [u8]>,
    id: StudentId,
) -> Result<Vec<(u32, GradeRow)>, GradebookError> {
    let mut rows = Vec::new();
    for entry in table
        .range((id.0, 0u32)..=(id.0, u32::MAX))
        .map_err(io_err)?
    {
        let (key, data) = entry.map_err(io_err)?;
        rows.push((key.value().1, decode::<GradeRow>(data.value())?));
    }
    Ok(rows)
}

/// Assemble a full record from its identity row and grade rows.
fn assemble(id: StudentId, row: StudentRow, grades: Vec<(u32, GradeRow)>) -> StudentRecord {
    StudentRecord {
        id,
        name: row.name,
        lrn: row.lrn,
        nickname: row.nickname,
        created_at: row.created_at,
        grades: grades.into_iter().map(|(_, g)| g.into_pair()).collect(),
    }
}

/// A disk-backed student store using redb.
///
/// Deleting an unknown identifier is an error
/// (`GradebookError::StudentNotFound`).
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
    /// Next identifier to assign; mirrors the metadata table.
    next_id: u64,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a student database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GradebookError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(STUDENTS).map_err(io_err)?;
            let _ = write_txn.open_table(GRADES).map_err(io_err)?;
            let _ = write_txn.open_table(METADATA).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        let next_id = {
            let read_txn = db.begin_read().map_err(io_err)?;
            let table = read_txn.open_table(METADATA).map_err(io_err)?;
            table
                .get(NEXT_ID_KEY)
                .map_err(io_err)?
                .map(|v| v.value())
                .unwrap_or(1)
        };

        Ok(Self { db, next_id })
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<(), GradebookError> {
        self.db.compact().map_err(io_err)?;
        Ok(())
    }
}

// =============================================================================
// STUDENTSTORE TRAIT IMPLEMENTATION
// =============================================================================

impl StudentStore for RedbStore {
    fn create(&mut self, student: NewStudent) -> Result<StudentRecord, GradebookError> {
        let student = student.validate()?;

        let id = StudentId(self.next_id);
        let next_id = self.next_id.saturating_add(1);
        let record = student.into_record(id, Local::now().naive_local());

        let row = StudentRow {
            name: record.name.clone(),
            lrn: record.lrn.clone(),
            nickname: record.nickname.clone(),
            created_at: record.created_at,
        };
        let row_bytes = encode(&row)?;

        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut students = write_txn.open_table(STUDENTS).map_err(io_err)?;
            students
                .insert(id.0, row_bytes.as_slice())
                .map_err(io_err)?;

            let mut grades = write_txn.open_table(GRADES).map_err(io_err)?;
            for (ordinal, (subject, grade)) in (0u32..).zip(&record.grades) {
                let grade_bytes = encode(&GradeRow::new(subject, grade))?;
                grades
                    .insert((id.0, ordinal), grade_bytes.as_slice())
                    .map_err(io_err)?;
            }

            let mut meta = write_txn.open_table(METADATA).map_err(io_err)?;
            meta.insert(NEXT_ID_KEY, next_id).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;

        self.next_id = next_id;
        Ok(record)
    }

    fn read(&self, id: StudentId) -> Result<Option<StudentRecord>, GradebookError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let students = read_txn.open_table(STUDENTS).map_err(io_err)?;
        let grades = read_txn.open_table(GRADES).map_err(io_err)?;

        let row = match students.get(id.0).map_err(io_err)? {
            Some(data) => decode::<StudentRow>(data.value())?,
            None => return Ok(None),
        };
        let grade_rows = load_grade_rows(&grades, id)?;
        Ok(Some(assemble(id, row, grade_rows)))
    }

    fn update(
        &mut self,
        id: StudentId,
        update: StudentUpdate,
    ) -> Result<StudentRecord, GradebookError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let record = {
            let mut students = write_txn.open_table(STUDENTS).map_err(io_err)?;
            let mut grades = write_txn.open_table(GRADES).map_err(io_err)?;

            let row = match students.get(id.0).map_err(io_err)? {
                Some(data) => decode::<StudentRow>(data.value())?,
                None => return Err(GradebookError::StudentNotFound(id)),
            };
            let grade_rows = load_grade_rows(&grades, id)?;
            let ordinals: BTreeMap<Subject, u32> = grade_rows
                .iter()
                .map(|(ordinal, g)| (Subject::new(g.subject.clone()), *ordinal))
                .collect();

            let mut record = assemble(id, row, grade_rows);
            update.apply_to(&mut record)?;

            let row_bytes = encode(&StudentRow {
                name: record.name.clone(),
                lrn: record.lrn.clone(),
                nickname: record.nickname.clone(),
                created_at: record.created_at,
            })?;
            students
                .insert(id.0, row_bytes.as_slice())
                .map_err(io_err)?;

            for (subject, grade) in &record.grades {
                if let Some(&ordinal) = ordinals.get(subject) {
                    let grade_bytes = encode(&GradeRow::new(subject, grade))?;
                    grades
                        .insert((id.0, ordinal), grade_bytes.as_slice())
                        .map_err(io_err)?;
                }
            }
            record
        };
        write_txn.commit().map_err(io_err)?;
        Ok(record)
    }

    fn delete(&mut self, id: StudentId) -> Result<bool, GradebookError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut students = write_txn.open_table(STUDENTS).map_err(io_err)?;
            let removed = students.remove(id.0).map_err(io_err)?.is_some();
            if !removed {
                return Err(GradebookError::StudentNotFound(id));
            }

            // Cascade to grade rows.
            let mut grades = write_txn.open_table(GRADES).map_err(io_err)?;
            let ordinals: Vec<u32> = load_grade_rows(&grades, id)?
                .into_iter()
                .map(|(ordinal, _)| ordinal)
                .collect();
            for ordinal in ordinals {
                grades.remove((id.0, ordinal)).map_err(io_err)?;
            }
        }
        write_txn.commit().map_err(io_err)?;
        Ok(true)
    }

    fn list(&self, subject: Option<&Subject>) -> Result<Vec<StudentRecord>, GradebookError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let students = read_txn.open_table(STUDENTS).map_err(io_err)?;
        let grades = read_txn.open_table(GRADES).map_err(io_err)?;

        let mut records = Vec::new();
        for entry in students.iter().map_err(io_err)? {
            let (key, data) = entry.map_err(io_err)?;
            let id = StudentId(key.value());
            let row = decode::<StudentRow>(data.value())?;
            let record = assemble(id, row, load_grade_rows(&grades, id)?);
            if subject.is_none_or(|s| record.has_subject(s)) {
                records.push(record);
            }
        }

        if subject.is_some() {
            sort_by_name(&mut records);
        }
        Ok(records)
    }

    fn subjects(&self) -> Result<BTreeSet<Subject>, GradebookError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let grades = read_txn.open_table(GRADES).map_err(io_err)?;

        let mut subjects = BTreeSet::new();
        for entry in grades.iter().map_err(io_err)? {
            let (_, data) = entry.map_err(io_err)?;
            subjects.insert(Subject(decode::<GradeRow>(data.value())?.subject));
        }
        Ok(subjects)
    }

    fn count(&self) -> Result<usize, GradebookError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let students = read_txn.open_table(STUDENTS).map_err(io_err)?;
        Ok(students.len().map_err(io_err)? as usize)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::primitives::SUBJECTS;
    use tempfile::tempdir;

    fn grade(h: u16) -> GradeRecord {
        GradeRecord::new([Score::from_hundredths(h); 4])
    }

    #[test]
    fn create_and_read() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("test.redb")).expect("open db");

        let created = store
            .create(NewStudent::new("Ana").lrn("1001").nickname("Annie"))
            .expect("create");
        assert_eq!(created.id, StudentId(1));

        let read = store.read(created.id).expect("read").expect("present");
        assert_eq!(read, created);
        assert_eq!(read.grades.len(), SUBJECTS.len());
    }

    #[test]
    fn empty_name_rejected_nothing_stored() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("test.redb")).expect("open db");

        let result = store.create(NewStudent::new(""));
        assert!(matches!(result, Err(GradebookError::EmptyName)));
        assert_eq!(store.count().expect("count"), 0);
        assert!(store.subjects().expect("subjects").is_empty());
    }

    #[test]
    fn read_missing_is_none() {
        let temp = tempdir().expect("temp dir");
        let store = RedbStore::open(temp.path().join("test.redb")).expect("open db");
        assert!(store.read(StudentId(99)).expect("read").is_none());
    }

    #[test]
    fn delete_cascades_to_grades() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("test.redb")).expect("open db");

        let a = store.create(NewStudent::new("Ana")).expect("create");
        let b = store
            .create(NewStudent::with_grades("Ben", BTreeMap::new()).grade("Latin", grade(200)))
            .expect("create");

        assert!(store.delete(a.id).expect("delete"));
        assert!(store.read(a.id).expect("read").is_none());

        // Only Ben's subject remains.
        let subjects: Vec<_> = store.subjects().expect("subjects").into_iter().collect();
        assert_eq!(subjects, vec![Subject::new("Latin")]);
        assert!(store.read(b.id).expect("read").is_some());
    }

    #[test]
    fn delete_missing_is_not_found() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("test.redb")).expect("open db");

        let result = store.delete(StudentId(5));
        assert!(matches!(
            result,
            Err(GradebookError::StudentNotFound(StudentId(5)))
        ));
    }

    #[test]
    fn update_rewrites_rows() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("test.redb")).expect("open db");
        let a = store.create(NewStudent::new("Ana")).expect("create");

        let mut grades = BTreeMap::new();
        grades.insert(Subject::new("Physics"), grade(225));
        let updated = store
            .update(
                a.id,
                StudentUpdate {
                    lrn: Some("778".to_string()),
                    grades,
                    ..StudentUpdate::default()
                },
            )
            .expect("update");

        assert_eq!(updated.lrn.as_deref(), Some("778"));
        let read = store.read(a.id).expect("read").expect("present");
        assert_eq!(read, updated);
        assert_eq!(
            read.grades[&Subject::new("Physics")].average(),
            Score::from_hundredths(225)
        );
        assert_eq!(read.grades.len(), SUBJECTS.len());
    }

    #[test]
    fn failed_update_changes_nothing() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("test.redb")).expect("open db");
        let a = store.create(NewStudent::new("Ana")).expect("create");

        let result = store.update(
            a.id,
            StudentUpdate {
                name: Some("  ".to_string()),
                ..StudentUpdate::default()
            },
        );
        assert!(matches!(result, Err(GradebookError::EmptyName)));
        assert_eq!(store.read(a.id).expect("read"), Some(a));
    }

    #[test]
    fn update_missing_is_not_found() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("test.redb")).expect("open db");
        let result = store.update(StudentId(3), StudentUpdate::default());
        assert!(matches!(result, Err(GradebookError::StudentNotFound(_))));
    }

    #[test]
    fn list_orders() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("test.redb")).expect("open db");
        store.create(NewStudent::new("Zed")).expect("create");
        store.create(NewStudent::new("Ana")).expect("create");
        store
            .create(NewStudent::with_grades("Mia", BTreeMap::new()))
            .expect("create");

        let all: Vec<_> = store
            .list(None)
            .expect("list")
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(all, vec!["Zed", "Ana", "Mia"]);

        let filtered: Vec<_> = store
            .list(Some(&Subject::new("CS2")))
            .expect("list")
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(filtered, vec!["Ana", "Zed"]);
    }

    #[test]
    fn recovery_next_id_preserved() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");

        {
            let mut store = RedbStore::open(&db_path).expect("open db");
            store.create(NewStudent::new("Ana")).expect("create");
            let b = store.create(NewStudent::new("Ben")).expect("create");
            store.delete(b.id).expect("delete");
        }

        {
            let mut store = RedbStore::open(&db_path).expect("reopen db");
            assert_eq!(store.count().expect("count"), 1);
            let c = store.create(NewStudent::new("Cai")).expect("create");
            assert_eq!(c.id, StudentId(3));
        }
    }

    #[test]
    fn recovery_compact_and_reopen() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");

        {
            let mut store = RedbStore::open(&db_path).expect("open db");
            store.create(NewStudent::new("Ana")).expect("create");
            store.compact().expect("compact");
        }

        let store = RedbStore::open(&db_path).expect("reopen db");
        let ana = store.read(StudentId(1)).expect("read").expect("present");
        assert_eq!(ana.name, "Ana");
    }
}
