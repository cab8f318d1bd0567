use std::io;
use thiserror::Error;

/// Failures that abort insurance processing.
///
/// Recoverable conditions (orphaned parents, unknown templates, unknown
/// traders) never surface here; they are logged and the item is treated
/// conservatively.
#[derive(Error, Debug)]
pub enum InsuranceError {
    /// A lost item has no insurance record captured at raid end. The capture
    /// stage dropped data, so the raid must not be resolved.
    #[error("Insured item {item_id} not found in post-raid insurance data")]
    MissingPostRaidRecord { item_id: String },

    #[error("No profile stored for session {session_id}")]
    ProfileNotFound { session_id: String },

    #[error("Invalid session id {session_id:?}")]
    InvalidSessionId { session_id: String },

    #[error("Corrupt profile data: {0}")]
    Corrupt(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<bincode::Error> for InsuranceError {
    fn from(e: bincode::Error) -> Self {
        InsuranceError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for InsuranceError {
    fn from(e: serde_json::Error) -> Self {
        InsuranceError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, InsuranceError>;
