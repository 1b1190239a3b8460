use std::time::Duration;
use thiserror::Error;

/// Terminal failure cause of an upload job.
///
/// Each variant is reported verbatim to whoever started the job; none of
/// them is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// Transport-level failure before any response arrived.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a status outside [200, 300).
    #[error("Server responded {status}: {status_text}")]
    Server { status: u16, status_text: String },

    /// A success status whose body could not be decoded.
    #[error("Malformed analysis response: {0}")]
    Decode(String),

    /// No terminal response within the configured result timeout.
    #[error("No analysis result after {0:?}")]
    Timeout(Duration),
}

#[derive(Error, Debug)]
pub enum FluentError {
    #[error("Session not found: {0}")]
    NotFound(i64),

    #[error("No session selected")]
    EmptySelection,

    #[error("No sessions to export")]
    EmptyCollection,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Remote source responded {status}: {status_text}")]
    Remote { status: u16, status_text: String },

    #[error(transparent)]
    Upload(#[from] UploadError),

    /// A job handed to the driver had already been started.
    #[error("Upload job was already started (phase: {0})")]
    JobNotIdle(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl FluentError {
    /// Lookup and selection failures are shown to the user as a notice and
    /// leave the rest of the state usable.
    pub fn is_notice(&self) -> bool {
        matches!(
            self,
            FluentError::NotFound(_) | FluentError::EmptySelection | FluentError::EmptyCollection
        )
    }
}

pub type Result<T> = std::result::Result<T, FluentError>;
