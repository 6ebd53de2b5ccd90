//! JSON export and import of course lists

use crate::course::CourseRecord;
use crate::ExtractorError;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Filename used by the CLI when saving results
pub const DEFAULT_OUTPUT_FILE: &str = "courses_extracted.json";

/// Pretty JSON array with two-space indentation. Non-ASCII text is written as-is.
pub fn to_json_pretty(records: &[CourseRecord]) -> Result<String, ExtractorError> {
    Ok(serde_json::to_string_pretty(records)?)
}

pub fn save_json(path: impl AsRef<Path>, records: &[CourseRecord]) -> Result<(), ExtractorError> {
    let path = path.as_ref();
    let json = to_json_pretty(records)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)?;

    info!(path = %path.display(), courses = records.len(), "Saved courses");
    Ok(())
}

pub fn load_json(path: impl AsRef<Path>) -> Result<Vec<CourseRecord>, ExtractorError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    let records: Vec<CourseRecord> = serde_json::from_str(&raw)?;

    debug!(path = %path.display(), courses = records.len(), "Loaded courses");
    Ok(records)
}
