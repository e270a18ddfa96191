//! # Record Lifecycle Tests
//!
//! End-to-end behavior of the gradebook over both storage backends:
//! creation, derived views, updates, deletion, and document exchange.

#![allow(clippy::panic)]

use gradebook_core::primitives::SUBJECTS;
use gradebook_core::{
    FormFields, GradeRecord, GradeStatus, Gradebook, GradebookError, NewStudent, Score, StudentId,
    Subject, compute_student_stats, new_student_from_form, to_json_bytes, update_from_form,
};
use std::collections::BTreeMap;
use tempfile::tempdir;

fn quarters(h: [u16; 4]) -> GradeRecord {
    GradeRecord::new(h.map(Score::from_hundredths))
}

fn books() -> (tempfile::TempDir, Vec<Gradebook>) {
    let temp = tempdir().expect("temp dir");
    let redb = Gradebook::with_redb(temp.path().join("grades.redb")).expect("open");
    (temp, vec![Gradebook::new(), redb])
}

fn form(entries: &[(&str, &str)]) -> FormFields {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

// =============================================================================
// STATISTICS
// =============================================================================

mod statistics {
    use super::*;

    #[test]
    fn five_override_beats_mean() {
        let mut grades = BTreeMap::new();
        grades.insert(Subject::new("A"), quarters([500, 500, 500, 500]));
        grades.insert(Subject::new("B"), quarters([100, 100, 100, 100]));

        let stats = compute_student_stats(&grades);
        assert_eq!(stats.overall_average, Score::MAX);
    }

    #[test]
    fn no_subjects_falls_back() {
        let stats = compute_student_stats(&BTreeMap::new());
        assert_eq!(stats.overall_average, Score::ZERO);
        assert_eq!(
            GradeStatus::classify(stats.overall_average),
            GradeStatus::NotTaken
        );
        assert!(stats.highest.is_none());
        assert!(stats.lowest.is_none());
    }

    #[test]
    fn classifier_boundaries() {
        let cases = [
            (100, "Highest DL"),
            (150, "DL"),
            (250, "Normal"),
            (275, "Probationary"),
            (300, "Student removed from the system"),
            (350, "Student did not take the subject"),
        ];
        for (h, label) in cases {
            assert_eq!(GradeStatus::classify(Score::from_hundredths(h)).label(), label);
        }
    }
}

// =============================================================================
// LIFECYCLE
// =============================================================================

mod lifecycle {
    use super::*;

    #[test]
    fn empty_name_never_listed() {
        let (_temp, mut books) = books();
        for book in &mut books {
            let result = book.create(NewStudent::new("   "));
            assert!(matches!(result, Err(GradebookError::EmptyName)));
            assert!(book.list(None).expect("list").is_empty());
        }
    }

    #[test]
    fn delete_then_not_found() {
        let (_temp, mut books) = books();
        for book in &mut books {
            let record = book.create(NewStudent::new("Ana")).expect("create");
            book.delete(record.id).expect("delete");

            assert!(book.view(record.id).expect("view").is_none());
            assert!(matches!(
                book.update(record.id, Default::default()),
                Err(GradebookError::StudentNotFound(_))
            ));
            assert!(book.subjects().expect("subjects").is_empty());
        }
    }

    #[test]
    fn export_import_round_trip() {
        let (_temp, mut books) = books();
        for book in &mut books {
            let record = book
                .create(
                    NewStudent::with_grades("Ana", BTreeMap::new())
                        .grade("Physics", quarters([125, 200, 175, 150])),
                )
                .expect("create");

            let bytes = to_json_bytes(&book.export(record.id).expect("export")).expect("json");
            let imported = book.import(&bytes).expect("import");

            assert_ne!(imported.id, record.id);
            assert_eq!(imported.name, record.name);
            assert_eq!(imported.grades, record.grades);
        }
    }

    #[test]
    fn form_add_then_edit() {
        let (_temp, mut books) = books();
        for book in &mut books {
            let add = form(&[("name", "Ana"), ("PE_q1", "1"), ("PE_q2", "1.5"), ("PE_q3", "2"), ("PE_q4", "1.5")]);
            let record = book.create(new_student_from_form(&add)).expect("create");
            assert_eq!(record.grades.len(), SUBJECTS.len());
            assert_eq!(
                record.grades[&Subject::new("PE")].average(),
                Score::from_hundredths(150)
            );

            let edit = form(&[("lrn", "2024"), ("PE_q1", "abc"), ("Latin_q1", "1")]);
            let update = update_from_form(&edit, &record);
            let updated = book.update(record.id, update).expect("update");

            assert_eq!(updated.lrn.as_deref(), Some("2024"));
            assert_eq!(updated.grades[&Subject::new("PE")], GradeRecord::default());
            assert!(!updated.has_subject(&Subject::new("Latin")));
        }
    }

    #[test]
    fn filtered_list_is_name_ordered() {
        let (_temp, mut books) = books();
        for book in &mut books {
            book.create(NewStudent::new("Zoe")).expect("create");
            book.create(NewStudent::with_grades("Max", BTreeMap::new()))
                .expect("create");
            book.create(NewStudent::new("Ben")).expect("create");

            let names: Vec<_> = book
                .list(Some(&Subject::new("Biology")))
                .expect("list")
                .into_iter()
                .map(|s| s.name)
                .collect();
            assert_eq!(names, vec!["Ben", "Zoe"]);
            assert_eq!(book.count().expect("count"), 3);
        }
    }

    #[test]
    fn delete_unknown_differs_by_backend() {
        let (_temp, mut books) = books();
        let [memory, redb] = books.as_mut_slice() else {
            panic!("two backends");
        };
        assert!(!memory.delete(StudentId(9)).expect("delete"));
        assert!(matches!(
            redb.delete(StudentId(9)),
            Err(GradebookError::StudentNotFound(_))
        ));
    }
}
