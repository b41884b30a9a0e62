//! Error types for the dual-state manager

use stagekit_client::SourceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateError {
    /// Structural or schema violation in a document or draft edit.
    #[error(transparent)]
    Tree(#[from] stagekit_core::Error),

    /// Fetch or submit failed; nothing was applied.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A later-issued request already replaced the server copy; this fetch was dropped.
    #[error("request {request} superseded by request {applied}")]
    Superseded { request: u64, applied: u64 },
}

pub type StateResult<T> = std::result::Result<T, StateError>;

impl StateError {
    pub fn is_schema(&self) -> bool {
        match self {
            Self::Tree(e) => e.is_schema(),
            Self::Source(SourceError::Schema(e)) => e.is_schema(),
            _ => false,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Source(e) if e.is_transport())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Source(SourceError::Cancelled))
    }
}
