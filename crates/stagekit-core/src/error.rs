//! Error types for the assembly model

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("duplicate component name: {0}")]
    DuplicateName(String),

    #[error("parent component not found: {0}")]
    ParentNotFound(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn duplicate_name(name: impl Into<String>) -> Self {
        Self::DuplicateName(name.into())
    }

    pub fn parent_not_found(name: impl Into<String>) -> Self {
        Self::ParentNotFound(name.into())
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    /// True for errors caused by a document that does not fit the Component shape.
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema(_) | Self::JsonError(_))
    }
}
