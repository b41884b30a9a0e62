//! Source-of-truth trait: fetch the assembly, submit a replacement

use stagekit_core::Component;
use tokio_util::sync::CancellationToken;

/// Result type for source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Source error types
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("submission rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Schema(#[from] stagekit_core::Error),

    #[error("cancelled")]
    Cancelled,

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl SourceError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Failures at the network or status level, as opposed to malformed documents.
    pub fn is_transport(&self) -> bool {
        !matches!(self, Self::Schema(_))
    }
}

/// Where the canonical assembly lives.
///
/// The protocol is whole-tree replace: `fetch` returns the complete document,
/// `submit` sends a complete replacement and, on acceptance, returns the
/// canonical document the source stored.
#[async_trait::async_trait]
pub trait AssemblySource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch the current document. If `cancel` fires first the request is
    /// dropped and `SourceError::Cancelled` is returned.
    async fn fetch(&self, cancel: Option<CancellationToken>) -> SourceResult<Component>;

    /// Submit a replacement document and receive the canonical stored form.
    async fn submit(
        &self,
        document: &Component,
        cancel: Option<CancellationToken>,
    ) -> SourceResult<Component>;
}

/// Race `fut` against an optional cancellation token.
pub(crate) async fn cancellable<T>(
    fut: impl std::future::Future<Output = SourceResult<T>>,
    cancel: Option<CancellationToken>,
) -> SourceResult<T> {
    match cancel {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(SourceError::Cancelled),
                result = fut => result,
            }
        }
        None => fut.await,
    }
}
