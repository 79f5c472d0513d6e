use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use super::BrowseError;
use crate::jobs::is_script;

#[derive(Clone, Debug, Serialize)]
pub struct FileEntry {
    pub name: String,
    /// Absolute path.
    pub path: String,
    pub is_dir: bool,
    /// Whether the entry has the runnable script extension.
    pub is_script: bool,
    /// File size in bytes, files only.
    pub size: Option<u64>,
    /// Modification time as unix seconds.
    pub modified: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct DirListing {
    pub current_path: String,
    /// None at the filesystem root.
    pub parent: Option<String>,
    pub items: Vec<FileEntry>,
}

/// List the immediate children of a directory, directories first, then
/// case-insensitive by name. Dot-prefixed entries are excluded; entries
/// whose metadata cannot be read are skipped.
pub fn list_dir(path: &Path) -> Result<DirListing, BrowseError> {
    if !path.exists() {
        return Err(BrowseError::PathNotFound);
    }
    let dir = path.canonicalize()?;
    if !dir.is_dir() {
        return Err(BrowseError::NotADirectory);
    }

    let entries = fs::read_dir(&dir).map_err(|err| {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            BrowseError::PermissionDenied
        } else {
            BrowseError::Io(err)
        }
    })?;

    let mut items = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        if let Some(info) = file_info(&entry.path()) {
            items.push(info);
        }
    }
    items.sort_by_key(|item| (!item.is_dir, item.name.to_lowercase()));

    Ok(DirListing {
        current_path: dir.to_string_lossy().into_owned(),
        parent: dir.parent().map(|p| p.to_string_lossy().into_owned()),
        items,
    })
}

fn file_info(path: &Path) -> Option<FileEntry> {
    let metadata = fs::metadata(path).ok()?;
    let is_dir = metadata.is_dir();
    Some(FileEntry {
        name: path.file_name()?.to_string_lossy().into_owned(),
        path: path.to_string_lossy().into_owned(),
        is_dir,
        is_script: !is_dir && is_script(path),
        size: (!is_dir).then(|| metadata.len()),
        modified: metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs()),
    })
}
