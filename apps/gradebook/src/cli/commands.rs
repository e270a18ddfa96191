//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api;
use crate::bundle::write_bundle;
use crate::config::{Backend, Config};
use gradebook_core::primitives::MAX_DOCUMENT_SIZE;
use gradebook_core::{
    Extreme, Gradebook, GradebookError, NewStudent, StudentId, StudentRecord, StudentUpdate,
    StudentView, Subject, compute_student_stats, grade_status, parse_grade_assignment,
    to_json_bytes,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// =============================================================================
// PATH VALIDATION
// =============================================================================

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), GradebookError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| GradebookError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(GradebookError::InvalidDocument(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and ensure it is a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, GradebookError> {
    let canonical = path.canonicalize().map_err(|e| {
        GradebookError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(GradebookError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Canonicalize the parent directory of an output path.
fn validate_output_path(path: &Path) -> Result<PathBuf, GradebookError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        GradebookError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(GradebookError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| GradebookError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

fn print_json<T: serde::Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn format_extreme(extreme: Option<&Extreme>) -> String {
    match extreme {
        Some(e) => {
            let subjects: Vec<&str> = e.subjects.iter().map(Subject::as_str).collect();
            format!("{} ({})", e.score, subjects.join(", "))
        }
        None => "-".to_string(),
    }
}

fn print_record_line(record: &StudentRecord) {
    let stats = compute_student_stats(&record.grades);
    println!(
        "{:>5}  {:<30} {:>5}  {}",
        record.id.0,
        record.name,
        stats.overall_average,
        grade_status(stats.overall_average)
    );
}

fn print_view(view: &StudentView) {
    let record = &view.record;
    println!("Student #{}", record.id.0);
    println!("==================");
    println!("Name:     {}", record.name);
    println!("LRN:      {}", record.lrn.as_deref().unwrap_or("-"));
    println!("Nickname: {}", record.nickname.as_deref().unwrap_or("-"));
    println!("Created:  {}", record.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!();
    println!("{:<12} {:>5} {:>5} {:>5} {:>5}  {:>5}", "Subject", "Q1", "Q2", "Q3", "Q4", "Avg");
    for (subject, grade) in &record.grades {
        let [q1, q2, q3, q4] = grade.quarters;
        println!(
            "{:<12} {:>5} {:>5} {:>5} {:>5}  {:>5}",
            subject,
            q1,
            q2,
            q3,
            q4,
            grade.average()
        );
    }
    println!();
    println!("Highest:  {}", format_extreme(view.stats.highest.as_ref()));
    println!("Lowest:   {}", format_extreme(view.stats.lowest.as_ref()));
    println!("GWA:      {}", view.stats.overall_average);
    println!("Status:   {}", view.status);
}

/// Parse every `Subject=q1,q2,q3,q4` assignment.
fn parse_grades(
    assignments: &[String],
) -> Result<BTreeMap<Subject, gradebook_core::GradeRecord>, GradebookError> {
    assignments
        .iter()
        .map(|a| parse_grade_assignment(a))
        .collect()
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &Config) -> Result<(), GradebookError> {
    let gradebook = open_gradebook(config)?;

    println!("Gradebook Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", config.host);
    println!("  Port:       {}", config.port);
    println!("  Backend:    {}", config.backend);
    println!("  Database:   {:?}", config.database);
    println!("  Source dir: {:?}", config.source_dir);
    println!();
    println!("Endpoints:");
    for (method, path, description) in api::ENDPOINTS {
        println!("  {:<4} {:<26} - {}", method, path, description);
    }
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(&config.bind_addr(), gradebook, config.server_settings()).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new database.
pub fn cmd_init(config: &Config, force: bool) -> Result<(), GradebookError> {
    if config.backend == Backend::Memory {
        println!("In-memory backend needs no initialization");
        return Ok(());
    }

    let db_path = &config.database;
    if db_path.exists() {
        if !force {
            return Err(GradebookError::IoError(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(db_path).map_err(|e| {
            GradebookError::IoError(format!("Cannot remove '{}': {}", db_path.display(), e))
        })?;
    }

    Gradebook::with_redb(db_path)?;
    println!("Initialized new redb database at {:?}", db_path);
    Ok(())
}

// =============================================================================
// STATUS / LIST COMMANDS
// =============================================================================

/// Show record counts.
pub fn cmd_status(config: &Config, json_mode: bool) -> Result<(), GradebookError> {
    let gradebook = open_gradebook(config)?;
    let student_count = gradebook.count()?;
    let subject_count = gradebook.subjects()?.len();

    if json_mode {
        print_json(&serde_json::json!({
            "database": config.database.to_string_lossy(),
            "backend": gradebook.backend_name(),
            "student_count": student_count,
            "subject_count": subject_count
        }));
        return Ok(());
    }

    println!("Gradebook Status");
    println!("================");
    println!("Database: {:?}", config.database);
    println!("Backend:  {}", gradebook.backend_name());
    println!();
    println!("Students: {}", student_count);
    println!("Subjects: {}", subject_count);

    Ok(())
}

/// List students, optionally only those graded in `subject`.
pub fn cmd_list(
    config: &Config,
    json_mode: bool,
    subject: Option<&str>,
) -> Result<(), GradebookError> {
    let gradebook = open_gradebook(config)?;
    let filter = subject.map(Subject::new);
    let students = gradebook.list(filter.as_ref())?;

    if json_mode {
        let summaries: Vec<api::StudentSummary> = students
            .iter()
            .map(|s| api::StudentSummary::from_record(s, filter.as_ref()))
            .collect();
        print_json(&summaries);
        return Ok(());
    }

    if students.is_empty() {
        println!("No students");
        return Ok(());
    }
    println!("{:>5}  {:<30} {:>5}  Status", "ID", "Name", "GWA");
    for record in &students {
        print_record_line(record);
    }
    Ok(())
}

// =============================================================================
// STUDENT COMMANDS
// =============================================================================

/// Add a student.
pub fn cmd_add(
    config: &Config,
    json_mode: bool,
    name: String,
    lrn: Option<String>,
    nickname: Option<String>,
    grades: &[String],
) -> Result<(), GradebookError> {
    let mut student = NewStudent::new(name);
    student.lrn = lrn;
    student.nickname = nickname;
    student.grades.extend(parse_grades(grades)?);

    let mut gradebook = open_gradebook(config)?;
    let record = gradebook.create(student)?;
    tracing::info!(student_id = %record.id, name = %record.name, "student_created");

    if json_mode {
        print_json(&record);
    } else {
        println!("Added student #{} ({})", record.id.0, record.name);
    }
    Ok(())
}

/// Show one student with statistics.
pub fn cmd_show(config: &Config, json_mode: bool, id: u64) -> Result<(), GradebookError> {
    let id = StudentId(id);
    let gradebook = open_gradebook(config)?;
    let view = gradebook
        .view(id)?
        .ok_or(GradebookError::StudentNotFound(id))?;

    if json_mode {
        print_json(&api::ViewResponse::from(view));
    } else {
        print_view(&view);
    }
    Ok(())
}

/// Update a student.
pub fn cmd_edit(
    config: &Config,
    json_mode: bool,
    id: u64,
    name: Option<String>,
    lrn: Option<String>,
    nickname: Option<String>,
    grades: &[String],
) -> Result<(), GradebookError> {
    let id = StudentId(id);
    let grades = parse_grades(grades)?;

    let mut gradebook = open_gradebook(config)?;
    let current = gradebook.get(id)?;
    for subject in grades.keys().filter(|s| !current.has_subject(s)) {
        tracing::warn!("Student {} has no grade for {}; ignored", id, subject);
    }

    let record = gradebook.update(
        id,
        StudentUpdate {
            name,
            lrn,
            nickname,
            grades,
        },
    )?;
    tracing::info!(student_id = %record.id, "student_updated");

    if json_mode {
        print_json(&record);
    } else {
        println!("Updated student #{} ({})", record.id.0, record.name);
    }
    Ok(())
}

/// Delete a student and its grades.
pub fn cmd_delete(config: &Config, id: u64) -> Result<(), GradebookError> {
    let id = StudentId(id);
    let mut gradebook = open_gradebook(config)?;
    if !gradebook.delete(id)? {
        return Err(GradebookError::StudentNotFound(id));
    }
    tracing::info!(student_id = %id, "student_deleted");
    println!("Deleted student #{}", id.0);
    Ok(())
}

// =============================================================================
// EXPORT / IMPORT COMMANDS
// =============================================================================

/// Export one student as a JSON document.
pub fn cmd_export(config: &Config, id: u64, output: &Path) -> Result<(), GradebookError> {
    let validated_output = validate_output_path(output)?;

    let gradebook = open_gradebook(config)?;
    let data = to_json_bytes(&gradebook.export(StudentId(id))?)?;

    std::fs::write(&validated_output, &data)
        .map_err(|e| GradebookError::IoError(format!("Write file: {}", e)))?;

    println!("Exported {} bytes to {:?}", data.len(), validated_output);
    Ok(())
}

/// Import a student from a JSON document.
pub fn cmd_import(config: &Config, json_mode: bool, input: &Path) -> Result<(), GradebookError> {
    let validated_path = validate_file_path(input)?;
    validate_file_size(&validated_path, MAX_DOCUMENT_SIZE as u64)?;

    let data = std::fs::read(&validated_path)
        .map_err(|e| GradebookError::IoError(format!("Read file: {}", e)))?;

    let mut gradebook = open_gradebook(config)?;
    let record = gradebook.import(&data)?;
    tracing::info!(student_id = %record.id, name = %record.name, "student_imported");

    if json_mode {
        print_json(&record);
    } else {
        println!("Imported student #{} ({})", record.id.0, record.name);
    }
    Ok(())
}

// =============================================================================
// BUNDLE COMMAND
// =============================================================================

/// Write the source tree as a ZIP archive.
pub fn cmd_bundle(config: &Config, output: &Path) -> Result<(), GradebookError> {
    let validated_output = validate_output_path(output)?;
    let size = write_bundle(&config.source_dir, &validated_output)?;
    println!(
        "Bundled {:?} into {:?} ({} bytes)",
        config.source_dir, validated_output, size
    );
    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Open the gradebook selected by the configuration.
pub fn open_gradebook(config: &Config) -> Result<Gradebook, GradebookError> {
    match config.backend {
        Backend::Redb => Gradebook::with_redb(&config.database),
        Backend::Memory => {
            tracing::debug!("Using in-memory backend; changes are not persisted");
            Ok(Gradebook::new())
        }
    }
}
