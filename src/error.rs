use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetailsError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("File not readable: {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Decode failed: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DetailsError {
    /// True for the errors that mean "no such file" to the caller
    pub fn is_missing_file(&self) -> bool {
        matches!(self, DetailsError::FileNotFound(_) | DetailsError::Unreadable { .. })
    }
}

pub type Result<T> = std::result::Result<T, DetailsError>;
