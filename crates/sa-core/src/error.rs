//! Error taxonomy of the synchronization core.
//!
//! Gateway failures are classified once (see [`crate::ports::GatewayError`])
//! and converted into the load-side [`FetchError`] or the mutation-side
//! [`MutationError`]. Both are surfaced to the UI as transient notifications;
//! none of them is meant to crash a page.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::RecordId;
use crate::ports::GatewayError;

/// Client-side rejection of a draft or patch, raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for the most common rule: a required text field is blank.
    pub fn required(field: impl Into<String>) -> Self {
        Self::new(field, "must not be empty")
    }
}

/// Failure of a collection load.
///
/// `Clone` so that a single in-flight load can hand the same outcome to every
/// caller that joined it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },

    #[error("server error: {message}")]
    Server {
        status: Option<u16>,
        message: String,
    },

    #[error("auth context is still loading")]
    AuthNotReady,
}

/// Failure of a create, update or delete round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },

    #[error("server error: {message}")]
    Server {
        status: Option<u16>,
        message: String,
    },

    #[error("record not found: {id}")]
    NotFound { id: RecordId },

    #[error("record '{name}' is protected and cannot be deleted")]
    Protected { name: String },
}

impl MutationError {
    /// Whether the failure happened before the gateway was contacted.
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NotFound { .. } | Self::Protected { .. }
        )
    }
}

impl From<GatewayError> for FetchError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Network(message) => Self::Network(message),
            GatewayError::Aborted => Self::Network("request aborted".to_string()),
            GatewayError::Timeout { after_ms } => Self::Timeout { after_ms },
            GatewayError::Server { status, message } => Self::Server { status, message },
            GatewayError::Decode(message) => Self::Server {
                status: None,
                message: format!("undecodable response: {message}"),
            },
        }
    }
}

impl From<GatewayError> for MutationError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Network(message) => Self::Network(message),
            GatewayError::Aborted => Self::Network("request aborted".to_string()),
            GatewayError::Timeout { after_ms } => Self::Timeout { after_ms },
            GatewayError::Server { status, message } => Self::Server { status, message },
            GatewayError::Decode(message) => Self::Server {
                status: None,
                message: format!("undecodable response: {message}"),
            },
        }
    }
}
