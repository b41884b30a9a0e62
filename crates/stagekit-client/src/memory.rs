//! In-process source of truth, for tests and offline editing

use crate::source::{cancellable, AssemblySource, SourceError, SourceResult};
use stagekit_core::{canonicalize, validate_document, Component};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct MemoryState {
    document: Component,
    fail_next: Option<String>,
    reject_next: Option<String>,
    fetches: usize,
    submits: usize,
}

/// Holds the canonical document in memory and behaves like the HTTP server:
/// submissions are validated, canonicalized and stored.
///
/// `fail_next` and `reject_next` script a single failure for the next call.
#[derive(Default)]
pub struct MemorySource {
    state: Mutex<MemoryState>,
}

impl MemorySource {
    pub fn new(document: Component) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                document,
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn document(&self) -> Component {
        self.lock().document.clone()
    }

    /// Replace the stored document, as another client would.
    pub fn set_document(&self, document: Component) {
        self.lock().document = document;
    }

    /// Make the next fetch or submit fail at the transport level.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.lock().fail_next = Some(message.into());
    }

    /// Make the next submit be rejected with a 422.
    pub fn reject_next(&self, message: impl Into<String>) {
        self.lock().reject_next = Some(message.into());
    }

    pub fn fetch_count(&self) -> usize {
        self.lock().fetches
    }

    pub fn submit_count(&self) -> usize {
        self.lock().submits
    }

    fn do_fetch(&self) -> SourceResult<Component> {
        let mut state = self.lock();
        state.fetches += 1;
        if let Some(message) = state.fail_next.take() {
            return Err(SourceError::RequestFailed(message));
        }
        Ok(state.document.clone())
    }

    fn do_submit(&self, document: &Component) -> SourceResult<Component> {
        let mut state = self.lock();
        state.submits += 1;
        if let Some(message) = state.fail_next.take() {
            return Err(SourceError::RequestFailed(message));
        }
        if let Some(message) = state.reject_next.take() {
            return Err(SourceError::rejected(422, message));
        }
        let mut canonical = document.clone();
        canonicalize(&mut canonical);
        validate_document(&canonical).map_err(|e| SourceError::rejected(422, e.to_string()))?;
        state.document = canonical.clone();
        Ok(canonical)
    }
}

#[async_trait::async_trait]
impl AssemblySource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch(&self, cancel: Option<CancellationToken>) -> SourceResult<Component> {
        cancellable(async { self.do_fetch() }, cancel).await
    }

    async fn submit(
        &self,
        document: &Component,
        cancel: Option<CancellationToken>,
    ) -> SourceResult<Component> {
        cancellable(async { self.do_submit(document) }, cancel).await
    }
}
