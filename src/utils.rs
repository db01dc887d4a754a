// ABOUTME: Filesystem and text helpers shared by the stepdeck modules
// ABOUTME: Input checks, output directory preparation, image URL handling and HTML escaping

use crate::errors::{DeckError, Result};
use log::warn;
use std::path::{Path, PathBuf};
use url::Url;

/// Fail unless `path` names an existing regular file, such as a deck or an exported HTML page.
pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(DeckError::PathNotFoundError(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(DeckError::ValidationError(format!(
            "Expected a file but found something else at {:?}",
            path
        )));
    }
    Ok(())
}

/// Create an output directory (step images, HTML, PDF) unless it already exists.
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    } else if !path.is_dir() {
        return Err(DeckError::ValidationError(format!(
            "Output path exists but is not a directory: {:?}",
            path
        )));
    }
    Ok(())
}

/// Create the directory an output file will be written into.
pub fn ensure_parent_directory_exists(file_path: &Path) -> Result<()> {
    ensure_directory_exists(&parent_dir(file_path))
}

/// Directory containing `file_path`, `.` for bare file names.
pub fn parent_dir(file_path: &Path) -> PathBuf {
    match file_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Check that step images can be written into `path` by creating and removing a scratch file.
pub fn validate_directory_writable(path: &Path) -> Result<()> {
    ensure_directory_exists(path)?;

    let scratch = path.join(format!(".stepdeck_{}.tmp", uuid::Uuid::new_v4()));
    if let Err(e) = std::fs::File::create(&scratch) {
        return Err(DeckError::ValidationError(format!(
            "Cannot write step images into {:?}: {}",
            path, e
        )));
    }
    if let Err(e) = std::fs::remove_file(&scratch) {
        warn!("Left scratch file {:?} behind: {}", scratch, e);
    }
    Ok(())
}

pub fn get_absolute_path(path: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(path).map_err(|e| {
        DeckError::ValidationError(format!("Failed to get absolute path for {:?}: {}", path, e))
    })
}

/// True for image references such as `https://…` or `data:…` that are not filesystem paths.
pub fn is_url(reference: &str) -> bool {
    Url::parse(reference)
        .map(|url| url.scheme().len() > 1)
        .unwrap_or(false)
}

/// Escape text for inclusion in HTML element content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
