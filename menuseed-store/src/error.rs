//! Error types for menuseed-store.

use serde::Deserialize;
use thiserror::Error;

/// All errors a remote store, object store, or asset fetch can produce.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The backend answered with a non-success status.
    #[error("backend returned {status} ({kind}): {message}")]
    Api {
        status: u16,
        kind: String,
        message: String,
    },

    /// The request never produced a response (DNS, TLS, connection reset).
    #[error("transport error: {0}")]
    Transport(String),

    /// A response arrived but could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// An asset fetch succeeded but returned no bytes.
    #[error("empty payload from {url}")]
    EmptyPayload { url: String },
}

impl StoreError {
    /// Convenience constructor for [`StoreError::Api`].
    pub fn api(status: u16, kind: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Api {
            status,
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// HTTP status, when the backend produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The record already exists (unique id or unique index clash).
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Error body the backend attaches to failed requests.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

impl ApiErrorBody {
    pub(crate) fn into_error(self, status: u16) -> StoreError {
        let kind = if self.kind.is_empty() {
            "unknown".to_string()
        } else {
            self.kind
        };
        StoreError::api(status, kind, self.message)
    }
}
