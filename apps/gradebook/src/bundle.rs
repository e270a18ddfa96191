//! # Source Bundle
//!
//! Packs the application's source tree into an in-memory ZIP archive for
//! the `/download_source` endpoint and the `bundle` command.
//!
//! Skipped: `target/` and `.git/` directories, symlinks, and database files
//! (`*.db`, `*.redb`). Entries are added in sorted path order so the same
//! tree yields the same entry list.

use gradebook_core::GradebookError;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// File name offered to downloaders.
pub const BUNDLE_FILE_NAME: &str = "gradebook_source.zip";

/// Directory names never descended into.
const SKIPPED_DIRS: [&str; 2] = ["target", ".git"];

/// File extensions of database files.
const DATABASE_EXTENSIONS: [&str; 2] = ["db", "redb"];

fn io_err(context: &str, e: impl std::fmt::Display) -> GradebookError {
    GradebookError::IoError(format!("{}: {}", context, e))
}

fn is_database_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DATABASE_EXTENSIONS.contains(&ext))
}

/// Collect every bundled file under `root`, relative to it, sorted.
pub fn collect_files(root: &Path) -> Result<Vec<PathBuf>, GradebookError> {
    let mut files = Vec::new();
    let mut pending = vec![PathBuf::new()];

    while let Some(relative) = pending.pop() {
        let dir = root.join(&relative);
        let entries = std::fs::read_dir(&dir)
            .map_err(|e| io_err(&format!("Cannot read directory '{}'", dir.display()), e))?;

        for entry in entries {
            let entry = entry.map_err(|e| io_err("Cannot read directory entry", e))?;
            let file_type = entry
                .file_type()
                .map_err(|e| io_err("Cannot read file type", e))?;
            let name = entry.file_name();
            let path = relative.join(&name);

            if file_type.is_dir() {
                if !SKIPPED_DIRS.iter().any(|skip| name == *skip) {
                    pending.push(path);
                }
            } else if file_type.is_file() && !is_database_file(&path) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Archive entry name: relative path with `/` separators.
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Build the ZIP archive of `root` in memory.
pub fn bundle_source(root: &Path) -> Result<Vec<u8>, GradebookError> {
    let files = collect_files(root)?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for relative in &files {
        let contents = std::fs::read(root.join(relative))
            .map_err(|e| io_err(&format!("Cannot read '{}'", relative.display()), e))?;
        zip.start_file(entry_name(relative), opts)
            .map_err(|e| io_err("Failed to start zip entry", e))?;
        zip.write_all(&contents)
            .map_err(|e| io_err("Failed to write zip entry", e))?;
    }

    let cursor = zip
        .finish()
        .map_err(|e| io_err("Failed to finalize zip bundle", e))?;
    Ok(cursor.into_inner())
}

/// Build the archive of `root` and write it to `output`.
///
/// Returns the archive size in bytes.
pub fn write_bundle(root: &Path, output: &Path) -> Result<usize, GradebookError> {
    let data = bundle_source(root)?;
    std::fs::write(output, &data)
        .map_err(|e| io_err(&format!("Cannot write '{}'", output.display()), e))?;
    Ok(data.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;
    use zip::ZipArchive;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("mkdir");
        }
        std::fs::write(path, contents).expect("write");
    }

    fn sample_tree() -> tempfile::TempDir {
        let temp = tempdir().expect("temp dir");
        write(temp.path(), "Cargo.toml", "[workspace]");
        write(temp.path(), "src/main.rs", "fn main() {}");
        write(temp.path(), "src/api/mod.rs", "// api");
        write(temp.path(), "target/debug/gradebook", "binary");
        write(temp.path(), ".git/HEAD", "ref: refs/heads/main");
        write(temp.path(), "gradebook.db", "data");
        write(temp.path(), "data/grades.redb", "data");
        temp
    }

    #[test]
    fn collect_skips_build_and_database_files() {
        let temp = sample_tree();
        let names: Vec<String> = collect_files(temp.path())
            .expect("collect")
            .iter()
            .map(|p| entry_name(p))
            .collect();

        assert_eq!(names, vec!["Cargo.toml", "src/api/mod.rs", "src/main.rs"]);
    }

    #[test]
    fn archive_round_trips_contents() {
        let temp = sample_tree();
        let data = bundle_source(temp.path()).expect("bundle");

        let mut archive = ZipArchive::new(Cursor::new(data)).expect("zip");
        assert_eq!(archive.len(), 3);

        let mut main = String::new();
        archive
            .by_name("src/main.rs")
            .expect("entry")
            .read_to_string(&mut main)
            .expect("read");
        assert_eq!(main, "fn main() {}");
    }

    #[test]
    fn missing_root_is_an_error() {
        let temp = tempdir().expect("temp dir");
        let result = bundle_source(&temp.path().join("nope"));
        assert!(matches!(result, Err(GradebookError::IoError(_))));
    }

    #[test]
    fn write_bundle_creates_file() {
        let temp = sample_tree();
        let out = tempdir().expect("temp dir");
        let output = out.path().join(BUNDLE_FILE_NAME);

        let size = write_bundle(temp.path(), &output).expect("write");
        assert_eq!(std::fs::metadata(&output).expect("metadata").len() as usize, size);
    }
}
