use thiserror::Error;

use crate::palette::PaletteError;
use crate::session::UploadError;

/// Errors surfaced by a paint session. Only the save path and configuration
/// loading can fail; gesture handling and coordinate mapping never do.
#[derive(Debug, Error)]
pub enum PaintError {
    /// Something the save needs has not materialized yet
    #[error("{0} is not ready")]
    NotReady(&'static str),

    #[error("Failed to export canvas: {0}")]
    Export(#[from] image::ImageError),

    #[error("Upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("Invalid configuration: {0}")]
    Config(#[from] PaletteError),
}

/// Result type for session operations
pub type PaintResult<T> = Result<T, PaintError>;
