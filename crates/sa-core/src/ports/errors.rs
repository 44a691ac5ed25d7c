use thiserror::Error;

/// Failure reported by any remote port.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The request did not complete (connection refused, reset, DNS...).
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },

    /// The caller gave up on the request before it completed.
    #[error("request aborted")]
    Aborted,

    /// The request completed but the server reported failure
    /// (`{ success: false, error }` or a non-2xx status).
    #[error("server error: {message}")]
    Server {
        status: Option<u16>,
        message: String,
    },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            status: None,
            message: message.into(),
        }
    }
}
