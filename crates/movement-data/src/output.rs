//! Atomic JSON output files.
//!
//! Dataset and result files are written through a hidden temporary file in
//! the target directory followed by a rename, so an interrupted run never
//! leaves a partially written file at the target path.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs::{Dir, OpenOptions};
use serde::Serialize;

use crate::error::OutputError;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Serializes `value` as pretty-printed JSON and writes it atomically.
///
/// # Errors
///
/// Returns [`OutputError`] if the value cannot be serialized or the file
/// cannot be written.
///
/// # Example
///
/// ```
/// use camino::Utf8PathBuf;
/// use movement_data::write_pretty_json;
///
/// let dir = tempfile::tempdir().expect("create temp dir");
/// let path = Utf8PathBuf::from_path_buf(dir.path().join("movements.json"))
///     .expect("utf-8 temp path");
///
/// write_pretty_json(&path, &vec!["D00000", "D00001"]).expect("write dataset");
///
/// let contents = std::fs::read_to_string(&path).expect("read dataset");
/// assert!(contents.contains("D00000"));
/// ```
pub fn write_pretty_json<T>(path: &Utf8Path, value: &T) -> Result<(), OutputError>
where
    T: Serialize + ?Sized,
{
    let contents =
        serde_json::to_string_pretty(value).map_err(|error| OutputError::Serialize {
            message: error.to_string(),
        })?;

    let file_name = path.file_name().ok_or_else(|| OutputError::WriteError {
        path: path.to_path_buf(),
        message: "output path must name a file".to_owned(),
    })?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let dir = Dir::open_ambient_dir(parent.as_std_path(), ambient_authority()).map_err(
        |error| OutputError::WriteError {
            path: path.to_path_buf(),
            message: error.to_string(),
        },
    )?;

    write_atomic(&dir, file_name, path, &contents)
}

/// Writes contents to a file atomically using a temp file and rename.
fn write_atomic(
    dir: &Dir,
    file_name: &str,
    target_path: &Utf8Path,
    contents: &str,
) -> Result<(), OutputError> {
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos());
    let tmp_name = format!(
        ".{}.tmp.{}.{}.{}",
        file_name,
        std::process::id(),
        suffix,
        counter
    );

    write_to_temp_file(dir, &tmp_name, target_path, contents)?;
    rename_temp_to_target(dir, &tmp_name, file_name, target_path)?;
    sync_parent_directory(dir);

    Ok(())
}

fn write_to_temp_file(
    dir: &Dir,
    tmp_name: &str,
    target_path: &Utf8Path,
    contents: &str,
) -> Result<(), OutputError> {
    let write_error = |message: String| OutputError::WriteError {
        path: target_path.to_path_buf(),
        message,
    };

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let mut file = dir
        .open_with(tmp_name, &options)
        .map_err(|err| write_error(err.to_string()))?;

    let written = file
        .write_all(contents.as_bytes())
        .and_then(|()| file.sync_all());
    if let Err(err) = written {
        drop(file);
        discard_temp_file(dir, tmp_name);
        return Err(write_error(err.to_string()));
    }

    Ok(())
}

fn rename_temp_to_target(
    dir: &Dir,
    tmp_name: &str,
    target_name: &str,
    target_path: &Utf8Path,
) -> Result<(), OutputError> {
    if let Err(err) = replace_target(dir, tmp_name, target_name) {
        discard_temp_file(dir, tmp_name);
        return Err(OutputError::WriteError {
            path: target_path.to_path_buf(),
            message: err.to_string(),
        });
    }
    Ok(())
}

/// Removes a leftover temp file so a retried run starts with a clean
/// directory. The removal itself may fail; the original error wins.
fn discard_temp_file(dir: &Dir, tmp_name: &str) {
    drop(dir.remove_file(tmp_name));
}

#[cfg(windows)]
fn replace_target(dir: &Dir, tmp_name: &str, target_name: &str) -> io::Result<()> {
    // On Windows `rename` will not clobber an existing results file, so any
    // previous run's output has to go first.
    match dir.remove_file(target_name) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    dir.rename(tmp_name, dir, target_name)
}

#[cfg(not(windows))]
fn replace_target(dir: &Dir, tmp_name: &str, target_name: &str) -> io::Result<()> {
    dir.rename(tmp_name, dir, target_name)
}

/// The dataset only survives a crash once its directory entry is durable;
/// a failed sync still leaves a readable file, so the error is dropped.
fn sync_parent_directory(parent: &Dir) {
    drop(parent.open(".").and_then(|dir| dir.sync_all()));
}

#[cfg(test)]
mod tests {
    #![expect(clippy::expect_used, reason = "tests fail fast on broken fixtures")]

    use camino::Utf8PathBuf;
    use serde_json::json;

    use super::*;

    fn temp_file_path(dir: &tempfile::TempDir, file_name: &str) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join(file_name)).expect("utf-8 temp path")
    }

    #[test]
    fn writes_pretty_printed_json() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = temp_file_path(&dir, "movements.json");

        write_pretty_json(&path, &json!([{"device_id": "D00000"}])).expect("write file");

        let contents = std::fs::read_to_string(&path).expect("read file");
        assert!(contents.contains("\n  {"), "output must be indented");
        assert!(contents.contains("\"device_id\": \"D00000\""));
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = temp_file_path(&dir, "movements.json");

        write_pretty_json(&path, &json!(["first"])).expect("first write");
        write_pretty_json(&path, &json!(["second"])).expect("second write");

        let contents = std::fs::read_to_string(&path).expect("read file");
        assert!(contents.contains("second"));
        assert!(!contents.contains("first"));
    }

    #[test]
    fn leaves_no_temp_files_behind() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = temp_file_path(&dir, "movements.json");

        write_pretty_json(&path, &json!({"status": "ok"})).expect("write file");

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read temp dir")
            .map(|entry| entry.expect("dir entry").file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("movements.json")]);
    }

    #[test]
    fn rejects_missing_parent_directory() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = temp_file_path(&dir, "missing/movements.json");

        let result = write_pretty_json(&path, &json!([]));

        assert!(matches!(result, Err(OutputError::WriteError { .. })));
    }

    #[test]
    fn rejects_path_without_file_name() {
        let result = write_pretty_json(Utf8Path::new(".."), &json!([]));
        assert!(matches!(result, Err(OutputError::WriteError { .. })));
    }
}
