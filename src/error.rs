use thiserror::Error;

use crate::models::CandidateId;

/// Errors raised by a playlist store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Missing or empty bearer token, or the backend refused it
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Playlist not found: {0}")]
    NotFound(String),

    /// Backend unreachable, non-success status or unusable payload
    #[error("Transport error: {0}")]
    Transport(String),

    /// Local document could not be read, written or decoded
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Errors from the text-generation path
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Generation request failed: {0}")]
    Transport(String),

    #[error("Generated response does not match the song schema: {0}")]
    SchemaViolation(String),
}

/// Rejected workflow transitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Input is empty")]
    EmptyInput,

    #[error("Another {0} is still in flight")]
    Busy(&'static str),

    #[error("No candidates are being presented")]
    NotPresented,

    #[error("No candidates are selected")]
    NothingSelected,

    #[error("No target playlist is selected")]
    NoTargetPlaylist,

    #[error("Unknown candidate: {0}")]
    UnknownCandidate(CandidateId),
}

/// Errors surfaced by a curation session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Login requires a non-empty token")]
    EmptyToken,

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
