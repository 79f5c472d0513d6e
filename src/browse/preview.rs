use std::fs;
use std::path::Path;

use serde::Serialize;

use super::BrowseError;

/// Preview content is capped at 100 KiB.
pub const PREVIEW_MAX_BYTES: usize = 100 * 1024;

const TRUNCATION_SUFFIX: &str = "\n\n... (file truncated)";

#[derive(Debug, Serialize)]
pub struct FilePreview {
    pub content: String,
    pub path: String,
    pub name: String,
}

/// Read a file's text content for display. Decoding is lossy, invalid UTF-8
/// is replaced and never fatal. Files over the cap are cut at
/// [`PREVIEW_MAX_BYTES`] with a truncation suffix appended.
pub fn preview_file(path: &Path) -> Result<FilePreview, BrowseError> {
    if !path.exists() {
        return Err(BrowseError::PathNotFound);
    }
    if !path.is_file() {
        return Err(BrowseError::NotAFile);
    }

    let bytes = fs::read(path)?;
    let content = if bytes.len() > PREVIEW_MAX_BYTES {
        let mut content = String::from_utf8_lossy(&bytes[..PREVIEW_MAX_BYTES]).into_owned();
        content.push_str(TRUNCATION_SUFFIX);
        content
    } else {
        String::from_utf8_lossy(&bytes).into_owned()
    };

    Ok(FilePreview {
        content,
        path: path.to_string_lossy().into_owned(),
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    })
}
