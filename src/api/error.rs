use thiserror::Error;

use crate::claims::DecodeError;

/// Fallback detail when the provider rejects a request without a usable body
pub const GENERIC_ERROR_DETAIL: &str = "Something went wrong";

#[derive(Error, Debug)]
pub enum AuthError {
    /// Client-side validation failed; never reaches the network
    #[error("{0}")]
    Validation(String),

    /// The identity provider rejected the request (4xx with a detail string)
    #[error("{0}")]
    ProviderRejected(String),

    #[error("Invalid access token: {0}")]
    Decode(#[from] DecodeError),

    #[error("Identity provider unreachable: {0}")]
    NetworkOrTimeout(#[from] reqwest::Error),

    /// The refresh credential was rejected or missing; the local session
    /// has been cleared
    #[error("Session invalidated - please log in again")]
    SessionInvalidated,

    /// The credential store could not be read or written
    #[error("Credential storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

impl AuthError {
    /// Map a non-success provider response to an error.
    ///
    /// The provider reports failures as `{"detail": ...}` on the token and
    /// registration endpoints and `{"message": ...}` on the password-reset
    /// endpoints; fall back to a generic message for anything else.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.get("detail")
                    .or_else(|| v.get("message"))
                    .and_then(|d| d.as_str().map(str::to_string))
            })
            .unwrap_or_else(|| GENERIC_ERROR_DETAIL.to_string());

        tracing::debug!(status = %status, detail = %detail, "Provider rejected request");
        AuthError::ProviderRejected(detail)
    }

    /// Displayable message for UI surfaces.
    pub fn detail(&self) -> String {
        match self {
            AuthError::Validation(msg) | AuthError::ProviderRejected(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
