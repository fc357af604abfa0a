//! Client error types

use thiserror::Error;

use crate::session::SessionError;

/// Errors that can occur when talking to the asset-management API
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server answered 401; the stored session has already been cleared
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("API unavailable at {0}")]
    Unavailable(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

impl ClientError {
    /// True when the error means "sign in again"
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized { .. })
    }

    /// Message suitable for an inline error line
    ///
    /// Server-provided messages are shown verbatim; transport failures fall
    /// back to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Unauthorized { message } | ClientError::Api { message, .. }
                if !message.is_empty() =>
            {
                message.clone()
            }
            _ => fallback.to_string(),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
