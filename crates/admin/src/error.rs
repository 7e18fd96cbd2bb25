//! Error type for admin operations.

use thiserror::Error;

use crate::products::ValidationError;

/// Errors from the admin console and its backend client.
#[derive(Debug, Error)]
pub enum AdminError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the request.
    #[error("Backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint URL could not be built.
    #[error("Invalid endpoint: {0}")]
    Url(#[from] url::ParseError),

    /// Sign-in failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The signed-in user is not an admin.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The product form is invalid. Nothing was written.
    #[error("Invalid product: {0}")]
    Validation(#[from] ValidationError),
}

/// A failed admin write.
pub type WriteError = AdminError;

/// Result type alias for `AdminError`.
pub type Result<T> = std::result::Result<T, AdminError>;

impl AdminError {
    /// Whether the failure came from the caller's input rather than the
    /// backend.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
