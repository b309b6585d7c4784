//! Error handling and custom error types
//!
//! Two layers, both built on thiserror:
//!
//! * [`GenerationError`] is the taxonomy of everything that can go wrong inside a
//!   single `generate()` call. The facade turns each variant into a failed
//!   [`GenerationResult`](crate::models::GenerationResult) instead of returning it.
//! * [`Error`] covers setup concerns (config, settings files, request validation)
//!   and wraps [`GenerationError`] for callers that want `?` propagation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid generation request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure modes of one generation call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("No usable credential configured for provider '{provider}'")]
    MissingCredential { provider: String },

    #[error("Provider rejected the request{}: {message}", status_suffix(.status))]
    SubmissionRejected {
        status: Option<u16>,
        message: String,
    },

    #[error("Unrecognized provider response: {body}")]
    UnrecognizedResponse { body: String },

    #[error("Status probe failed: {0}")]
    PollTransport(String),

    #[error("Provider reported failure: {message}")]
    ProviderReportedFailure { message: String },

    #[error("Job completed but no artifact URL could be extracted")]
    ArtifactMissing,

    #[error("Job did not finish after {attempts} status attempts")]
    Timeout { attempts: u32 },

    #[error("Generation was cancelled")]
    Cancelled,
}

impl GenerationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::MissingCredential { .. } => ErrorKind::MissingCredential,
            GenerationError::SubmissionRejected { .. } => ErrorKind::SubmissionRejected,
            GenerationError::UnrecognizedResponse { .. } => ErrorKind::UnrecognizedResponse,
            GenerationError::PollTransport(_) => ErrorKind::PollTransportError,
            GenerationError::ProviderReportedFailure { .. } => ErrorKind::ProviderReportedFailure,
            GenerationError::ArtifactMissing => ErrorKind::ArtifactMissing,
            GenerationError::Timeout { .. } => ErrorKind::Timeout,
            GenerationError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// The provider's own wording, for the variants that carry it.
    pub fn provider_message(&self) -> Option<&str> {
        match self {
            GenerationError::SubmissionRejected { message, .. }
            | GenerationError::ProviderReportedFailure { message } => Some(message),
            _ => None,
        }
    }

    /// Whether the poll loop should keep going after this outcome.
    pub(crate) fn is_transient(&self) -> bool {
        matches!(self, GenerationError::PollTransport(_))
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {})", s)).unwrap_or_default()
}

/// Serializable discriminant carried by a failed `GenerationResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    MissingCredential,
    SubmissionRejected,
    UnrecognizedResponse,
    PollTransportError,
    ProviderReportedFailure,
    ArtifactMissing,
    Timeout,
    Cancelled,
}
