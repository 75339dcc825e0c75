//! Error types for map image generation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while generating course map images.
#[derive(Error, Debug)]
pub enum MapImageError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("course {course_id}: {reason}")]
    Validation { course_id: u32, reason: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("static map API returned {status}: {body}")]
    ExternalService { status: u16, body: String },

    #[error("filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl MapImageError {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for map image operations.
pub type Result<T> = std::result::Result<T, MapImageError>;
