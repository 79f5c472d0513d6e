//! Synchronous filesystem collaborators: directory listing and file preview.

mod listing;
mod preview;

pub use listing::{list_dir, DirListing, FileEntry};
pub use preview::{preview_file, FilePreview, PREVIEW_MAX_BYTES};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowseError {
    #[error("Path does not exist")]
    PathNotFound,
    #[error("Path is not a directory")]
    NotADirectory,
    #[error("Permission denied")]
    PermissionDenied,
    #[error("Not a file")]
    NotAFile,
    #[error("{0}")]
    Io(#[from] std::io::Error),
}
