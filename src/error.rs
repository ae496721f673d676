use thiserror::Error;

/// Errors returned by book generation operations.
#[derive(Error, Debug)]
pub enum BookError {
    /// The form is not in a submittable state.
    #[error("{0}")]
    Validation(String),

    /// A form field could not be updated from its raw value.
    #[error("Invalid value for '{field}': {message}")]
    InvalidField { field: String, message: String },

    /// The generate endpoint answered with a non-success status.
    #[error("Failed to start book generation")]
    Create { status: u16, body: String },

    /// The status endpoint answered with a non-success status.
    #[error("Failed to check status")]
    StatusCheck { status: u16, body: String },

    /// The download endpoint answered with a non-success status.
    #[error("Failed to download book (HTTP {status})")]
    Download { status: u16 },

    /// Network-level request failure with context.
    #[error("{context}: {source}")]
    Network {
        context: String,
        source: reqwest::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BookError>;
