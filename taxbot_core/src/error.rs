use std::time::Duration;
use thiserror::Error;

/// Failure of an external language-model call.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model transport error: {0}")]
    Transport(String),

    #[error("model API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected model response: {0}")]
    InvalidResponse(String),

    #[error("empty response from model")]
    EmptyResponse,
}
