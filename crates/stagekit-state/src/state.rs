//! Dual-state manager: a server-confirmed tree and a locally edited draft
//!
//! The server copy only ever changes through a successful fetch or submit.
//! The draft only ever changes through explicit edits, an explicit
//! `discard_edits`, or the re-derivation that follows an accepted submit.
//!
//! Fetches and submits are stamped with a sequence number when issued. A
//! completion that arrives after a later-issued operation has already written
//! the server copy never overwrites that newer state. A stale fetch fails with
//! `StateError::Superseded`; a stale submit was still stored by the source and
//! reports `SubmitOutcome::Stale`.

use crate::error::{StateError, StateResult};
use stagekit_client::AssemblySource;
use stagekit_core::{tree, validate_document, Component};
use stagekit_kinematics::{
    compute_world_poses, compute_world_poses_with_positions, AxisPositions, Pose,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 64;

/// Change notifications for UI layers that bind to the state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateEvent {
    /// The server copy was replaced; `version` is its new stamp.
    ServerUpdated { version: u64 },
    /// The draft was re-derived from the server copy.
    DraftReset,
    /// The draft was edited in place.
    DraftEdited,
}

/// How an accepted submission landed locally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The canonical document is the server copy at `version`; the draft was
    /// re-derived from it.
    Applied { version: u64 },
    /// The source stored the submission, but request `applied` had already
    /// refreshed the server copy. Neither copy was touched.
    Stale { request: u64, applied: u64 },
}

impl SubmitOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// Server version written by this submission, if it was applied.
    pub fn version(&self) -> Option<u64> {
        match self {
            Self::Applied { version } => Some(*version),
            Self::Stale { .. } => None,
        }
    }
}

/// Which copy of the tree an operation reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeCopy {
    Server,
    Draft,
}

struct Inner {
    server: Component,
    draft: Component,
    server_version: u64,
    /// Sequence number of the operation that last wrote `server`.
    applied_request: u64,
}

/// Owns the server copy and the draft copy of one assembly.
///
/// Construct once per session and share by `Arc`.
pub struct AssemblyState {
    source: Arc<dyn AssemblySource>,
    inner: RwLock<Inner>,
    issued: AtomicU64,
    events: broadcast::Sender<StateEvent>,
}

impl AssemblyState {
    /// Start from the default root on both copies.
    pub fn new(source: Arc<dyn AssemblySource>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            source,
            inner: RwLock::new(Inner {
                server: Component::root(),
                draft: Component::root(),
                server_version: 0,
                applied_request: 0,
            }),
            issued: AtomicU64::new(0),
            events,
        }
    }

    pub fn source(&self) -> &Arc<dyn AssemblySource> {
        &self.source
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: StateEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn next_request(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Fetch from the source and replace the server copy. The draft is untouched.
    pub async fn sync_from_source(&self) -> StateResult<u64> {
        self.sync_from_source_cancellable(CancellationToken::new()).await
    }

    pub async fn sync_from_source_cancellable(
        &self,
        cancel: CancellationToken,
    ) -> StateResult<u64> {
        let request = self.next_request();
        debug!("Sync #{} from {} source", request, self.source.name());

        let document = self.source.fetch(Some(cancel)).await?;
        validate_document(&document)?;

        let version = {
            let mut inner = self.inner.write().await;
            if request < inner.applied_request {
                warn!("Sync #{} arrived after #{}; discarding", request, inner.applied_request);
                return Err(StateError::Superseded {
                    request,
                    applied: inner.applied_request,
                });
            }
            inner.server = document;
            inner.applied_request = request;
            inner.server_version += 1;
            inner.server_version
        };

        info!("Server copy updated to version {}", version);
        self.emit(StateEvent::ServerUpdated { version });
        Ok(version)
    }

    /// Overwrite the draft with a fresh copy of the server copy.
    pub async fn discard_edits(&self) {
        {
            let mut inner = self.inner.write().await;
            inner.draft = inner.server.clone();
        }
        debug!("Draft reset to server copy");
        self.emit(StateEvent::DraftReset);
    }

    /// Send the draft to the source. On acceptance the canonical document
    /// becomes the server copy and the draft is re-derived from it; on any
    /// failure neither copy changes.
    pub async fn submit_edits(&self) -> StateResult<SubmitOutcome> {
        self.submit_edits_cancellable(CancellationToken::new()).await
    }

    pub async fn submit_edits_cancellable(
        &self,
        cancel: CancellationToken,
    ) -> StateResult<SubmitOutcome> {
        let request = self.next_request();
        let submitted = self.inner.read().await.draft.clone();
        validate_document(&submitted)?;
        debug!("Submit #{} to {} source", request, self.source.name());

        let canonical = match self.source.submit(&submitted, Some(cancel)).await {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Submit #{} failed: {}", request, e);
                return Err(e.into());
            }
        };
        validate_document(&canonical)?;

        let version = {
            let mut inner = self.inner.write().await;
            if request < inner.applied_request {
                warn!(
                    "Submit #{} accepted but #{} already refreshed the server copy; draft kept",
                    request, inner.applied_request
                );
                return Ok(SubmitOutcome::Stale {
                    request,
                    applied: inner.applied_request,
                });
            }
            if inner.draft != submitted {
                warn!(
                    "Draft edited while submit #{} was in flight; those edits are discarded",
                    request
                );
            }
            inner.server = canonical;
            inner.draft = inner.server.clone();
            inner.applied_request = request;
            inner.server_version += 1;
            inner.server_version
        };

        info!("Submit #{} accepted, server copy at version {}", request, version);
        self.emit(StateEvent::ServerUpdated { version });
        self.emit(StateEvent::DraftReset);
        Ok(SubmitOutcome::Applied { version })
    }

    /// True iff the draft differs from the server copy anywhere.
    pub async fn has_unsaved_edits(&self) -> bool {
        let inner = self.inner.read().await;
        inner.server != inner.draft
    }

    pub async fn server_version(&self) -> u64 {
        self.inner.read().await.server_version
    }

    pub async fn snapshot(&self, which: TreeCopy) -> Component {
        let inner = self.inner.read().await;
        match which {
            TreeCopy::Server => inner.server.clone(),
            TreeCopy::Draft => inner.draft.clone(),
        }
    }

    /// Read either copy without cloning it.
    pub async fn read<R>(&self, which: TreeCopy, f: impl FnOnce(&Component) -> R) -> R {
        let inner = self.inner.read().await;
        match which {
            TreeCopy::Server => f(&inner.server),
            TreeCopy::Draft => f(&inner.draft),
        }
    }

    /// Mutate the draft in place.
    pub async fn edit_draft<R>(&self, f: impl FnOnce(&mut Component) -> R) -> R {
        let result = {
            let mut inner = self.inner.write().await;
            f(&mut inner.draft)
        };
        self.emit(StateEvent::DraftEdited);
        result
    }

    /// Add a component under `parent_name` in the draft.
    pub async fn add_child(&self, parent_name: &str, component: Component) -> StateResult<()> {
        let name = component.name.clone();
        {
            let mut inner = self.inner.write().await;
            tree::add_child(&mut inner.draft, parent_name, component)?;
        }
        debug!("Draft: added {} under {}", name, parent_name);
        self.emit(StateEvent::DraftEdited);
        Ok(())
    }

    /// Remove a component and its subtree from the draft. Missing names are a no-op.
    pub async fn remove_by_name(&self, name: &str) -> bool {
        let removed = {
            let mut inner = self.inner.write().await;
            tree::remove_by_name(name, &mut inner.draft)
        };
        if removed {
            debug!("Draft: removed {}", name);
            self.emit(StateEvent::DraftEdited);
        }
        removed
    }

    pub async fn world_poses(&self, which: TreeCopy) -> BTreeMap<String, Pose> {
        self.read(which, compute_world_poses).await
    }

    pub async fn world_poses_with_positions(
        &self,
        which: TreeCopy,
        positions: &AxisPositions,
    ) -> BTreeMap<String, Pose> {
        self.read(which, |root| compute_world_poses_with_positions(root, positions))
            .await
    }
}
