//! Intake of uploaded files: media-type detection and transport encoding.

pub mod encode;
pub mod format;

pub use encode::*;
pub use format::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Could not read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("File is empty")]
    EmptyFile,

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("File too large: {size_mb:.1}MB exceeds {max_mb}MB limit")]
    FileTooLarge { size_mb: f64, max_mb: u64 },

    #[error("Invalid encoded payload: {0}")]
    InvalidPayload(String),
}
