//! Optimistic updates against a [`RemoteList`].
//!
//! A commit runs in three steps: the new list is applied locally, the
//! remote list is replaced, and if that write fails the local list is
//! reconciled with a fresh read of the remote one. Every step is announced
//! on a broadcast channel so the interface can tell the user about rollbacks.

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, error, warn};

use crate::api::ApiError;
use crate::store::RemoteList;

/// Progress of a commit, as seen by subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// The new list is live locally, the remote write is in flight
    Applied { total: usize },
    /// The remote accepted the new list
    Committed { total: usize },
    /// The remote write failed and the local list now mirrors the remote one
    RolledBack { reason: String, restored: usize },
    /// Both the write and the reload failed; local and remote may differ
    ReloadFailed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    RolledBack { reason: String },
    /// Nothing to write
    Unchanged,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("remote write failed ({write}) and reloading the remote list failed: {reload}")]
    ReloadFailed { write: ApiError, reload: ApiError },
}

fn announce(events: &broadcast::Sender<SyncEvent>, event: SyncEvent) {
    // No subscribers is fine
    let _ = events.send(event);
}

/// Apply `next` to `local`, push it to `remote`, reconcile on failure
pub async fn commit<T, R>(
    local: &mut Vec<T>,
    next: Vec<T>,
    remote: &R,
    events: &broadcast::Sender<SyncEvent>,
) -> Result<CommitOutcome, SyncError>
where
    T: Clone + Send + Sync,
    R: RemoteList<T> + ?Sized,
{
    *local = next;
    announce(events, SyncEvent::Applied { total: local.len() });

    let write_err = match remote.replace(local.as_slice()).await {
        Ok(()) => {
            debug!(total = local.len(), "Remote list replaced");
            announce(events, SyncEvent::Committed { total: local.len() });
            return Ok(CommitOutcome::Committed);
        }
        Err(e) => e,
    };

    warn!(error = %write_err, "Remote write failed, reloading remote list");

    match remote.fetch().await {
        Ok(authoritative) => {
            *local = authoritative;
            let reason = write_err.to_string();
            warn!(restored = local.len(), "Local changes rolled back");
            announce(
                events,
                SyncEvent::RolledBack {
                    reason: reason.clone(),
                    restored: local.len(),
                },
            );
            Ok(CommitOutcome::RolledBack { reason })
        }
        Err(reload_err) => {
            error!(error = %reload_err, "Reloading remote list failed");
            announce(
                events,
                SyncEvent::ReloadFailed {
                    reason: reload_err.to_string(),
                },
            );
            Err(SyncError::ReloadFailed {
                write: write_err,
                reload: reload_err,
            })
        }
    }
}
