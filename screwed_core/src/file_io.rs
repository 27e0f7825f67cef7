//! # File I/O Module
//!
//! Workbook file operations:
//! - **Atomic saves**: write to `.tmp`, verify, rename to prevent corruption
//! - **Version validation**: ensure schema compatibility on load
//!
//! ## File Format
//!
//! Workbooks are saved as `.scw` files containing JSON.
//!
//! ## Example
//!
//! ```rust,no_run
//! use screwed_core::file_io::{load_workbook, save_workbook};
//! use screwed_core::workbook::Workbook;
//! use std::path::Path;
//!
//! let workbook = Workbook::new("J. Doe", "Gearbox housing");
//! let path = Path::new("housing.scw");
//! save_workbook(&workbook, path).unwrap();
//! let loaded = load_workbook(path).unwrap();
//! assert_eq!(loaded.meta.title, "Gearbox housing");
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{CalcError, CalcResult};
use crate::workbook::{Workbook, SCHEMA_VERSION};

/// Workbook file extension.
pub const EXTENSION: &str = "scw";

/// Temporary path used while saving: `<name>.scw.tmp`.
fn tmp_path_for(path: &Path) -> PathBuf {
    let extension = path
        .extension()
        .map(|e| format!("{}.tmp", e.to_string_lossy()))
        .unwrap_or_else(|| "tmp".to_string());
    path.with_extension(extension)
}

/// Save a workbook to a file with atomic write semantics.
///
/// The save process:
/// 1. Serialize workbook to JSON
/// 2. Parse the JSON back to catch values that do not survive a reload
/// 3. Write to a temporary file and sync it to disk
/// 4. Rename the temporary file over `path`
pub fn save_workbook(workbook: &Workbook, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(workbook).map_err(|e| CalcError::SerializationError {
        reason: e.to_string(),
    })?;

    serde_json::from_str::<Workbook>(&json).map_err(|e| CalcError::SerializationError {
        reason: format!("Workbook does not reload: {}", e),
    })?;

    let tmp_path = tmp_path_for(path);
    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        CalcError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    drop(tmp_file);

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    debug!(path = %path.display(), items = workbook.item_count(), "workbook saved");
    Ok(())
}

/// Load a workbook from a file.
///
/// # Returns
///
/// * `Err(CalcError::VersionMismatch)` - File version is incompatible
/// * `Err(CalcError::SerializationError)` - Invalid JSON
/// * `Err(CalcError::FileError)` - I/O error
pub fn load_workbook(path: &Path) -> CalcResult<Workbook> {
    let contents = fs::read_to_string(path)
        .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;

    // version before structure: newer schemas report a mismatch, not a parse error
    let header: serde_json::Value = serde_json::from_str(&contents).map_err(|e| CalcError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })?;
    let version = header
        .pointer("/meta/version")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    validate_version(version)?;

    let workbook: Workbook = serde_json::from_value(header).map_err(|e| CalcError::SerializationError {
        reason: format!("Invalid workbook in {}: {}", path.display(), e),
    })?;
    workbook.settings.validate()?;

    debug!(path = %path.display(), items = workbook.item_count(), "workbook loaded");
    Ok(workbook)
}

/// Validate that a file version is compatible with the current schema.
fn validate_version(file_version: &str) -> CalcResult<()> {
    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let file_parts: Vec<u32> = file_version
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();
    let current_parts: Vec<u32> = SCHEMA_VERSION
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();

    if file_parts.is_empty() || current_parts.is_empty() {
        return Err(mismatch());
    }

    // Major version must match
    if file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }

    // For 0.x versions a newer minor version may carry breaking changes
    if current_parts[0] == 0 && file_parts.len() > 1 && current_parts.len() > 1 && file_parts[1] > current_parts[1] {
        return Err(mismatch());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::StackInput;
    use crate::workbook::CalculationItem;

    fn workbook_path(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        dir.path().join(format!("{}.{}", name, EXTENSION))
    }

    #[test]
    fn test_tmp_path_generation() {
        assert_eq!(tmp_path_for(Path::new("/a/housing.scw")), Path::new("/a/housing.scw.tmp"));
        assert_eq!(tmp_path_for(Path::new("/a/housing")), Path::new("/a/housing.tmp"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = workbook_path(&dir, "roundtrip");

        let mut workbook = Workbook::new("Test Engineer", "Housing");
        let id = workbook.add_item(CalculationItem::Stack(StackInput {
            label: "gap".to_string(),
            expression: "[1 ±0.1]".to_string(),
            ..Default::default()
        }));
        save_workbook(&workbook, &path).unwrap();

        let loaded = load_workbook(&path).unwrap();
        assert_eq!(loaded.meta.author, "Test Engineer");
        assert_eq!(loaded.meta.title, "Housing");
        assert_eq!(loaded.get_item(&id).unwrap().label(), "gap");
    }

    #[test]
    fn test_atomic_save_creates_no_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = workbook_path(&dir, "atomic");

        save_workbook(&Workbook::default(), &path).unwrap();
        assert!(!tmp_path_for(&path).exists());
        assert!(path.exists());

        // saving again replaces the file
        save_workbook(&Workbook::new("Second", ""), &path).unwrap();
        assert_eq!(load_workbook(&path).unwrap().meta.author, "Second");
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.0").is_ok());
        assert!(validate_version("0.1.5").is_ok());
        assert!(validate_version("0.0.9").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("").is_err());
    }

    #[test]
    fn test_load_rejects_newer_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = workbook_path(&dir, "future");
        fs::write(
            &path,
            r#"{"meta": {"version": "0.9.0", "future_field": true}, "items": {"x": {"type": "Hologram"}}}"#,
        )
        .unwrap();
        assert!(matches!(load_workbook(&path), Err(CalcError::VersionMismatch { .. })));
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = workbook_path(&dir, "missing");
        assert!(matches!(load_workbook(&missing), Err(CalcError::FileError { .. })));

        let broken = workbook_path(&dir, "broken");
        fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(load_workbook(&broken), Err(CalcError::SerializationError { .. })));
    }
}
