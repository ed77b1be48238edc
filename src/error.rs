//! Error types for the unfiled-dl library.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur while authorizing, enumerating, or downloading.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing to the output zip archive failed.
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The OAuth flow could not produce a usable token.
    #[error("authorization failed: {0}")]
    Auth(String),

    /// The API rejected a request with a non-success status.
    #[error("API error {status}: {body}")]
    Api {
        /// HTTP status returned by the API.
        status: StatusCode,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The API rejected the cached token as unauthorized or out of scope.
    ///
    /// The cached token file has already been deleted when this is returned;
    /// the binary maps it to exit code 1 with an instruction to re-run.
    #[error("permission denied ({status}): {message}")]
    PermissionDenied {
        /// HTTP status (401 or 403).
        status: StatusCode,
        /// Guidance for the user.
        message: String,
    },
}

/// A specialized `Result` type for unfiled-dl operations.
pub type Result<T> = std::result::Result<T, Error>;
