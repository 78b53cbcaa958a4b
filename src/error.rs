//! Unified error types for the viewer core.

use std::fmt;
use std::path::PathBuf;

/// Application-specific errors.
#[derive(Debug)]
pub enum AppError {
    /// Target path no longer exists at load time
    FileMissing(PathBuf),
    /// Error decoding or re-encoding an image file
    ImageDecode(String),
    /// Error scanning a directory for image files
    DirectoryScan(String),
    /// The opened folder contains no supported images
    NoImages,
    /// Error reading metadata from a file
    MetadataRead(String),
    /// Error writing metadata to a file
    MetadataWrite(String),
    /// The display sink rejected an update
    DisplayFailure(String),
    /// A background worker was addressed before startup or after shutdown
    WorkerUnavailable(&'static str),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::FileMissing(path) => write!(f, "File does not exist: {}", path.display()),
            AppError::ImageDecode(msg) => write!(f, "Image decode error: {}", msg),
            AppError::DirectoryScan(msg) => write!(f, "Directory scan error: {}", msg),
            AppError::NoImages => write!(f, "No supported images in this folder"),
            AppError::MetadataRead(msg) => write!(f, "Metadata read error: {}", msg),
            AppError::MetadataWrite(msg) => write!(f, "Metadata write error: {}", msg),
            AppError::DisplayFailure(msg) => write!(f, "Display error: {}", msg),
            AppError::WorkerUnavailable(name) => {
                write!(f, "Background worker not running: {}", name)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::ImageDecode(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::DirectoryScan(err.to_string())
    }
}

/// Type alias for Results in this application.
pub type Result<T> = std::result::Result<T, AppError>;
