//! Source selection for a notebook.
//!
//! Every mutation builds the complete next list, applies it locally and
//! writes it back through [`optimistic::commit`]. The chat panel only reads
//! the selection.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::api::ApiError;
use crate::optimistic::{self, CommitOutcome, SyncError, SyncEvent};
use crate::store::RemoteList;
use crate::types::{Resource, Source};

/// Flip the selection of the source with `id`; the rest are copied as-is
pub fn toggled_one(sources: &[Source], id: &str) -> Vec<Source> {
    sources
        .iter()
        .map(|s| {
            let mut s = s.clone();
            if s.id == id {
                s.selected = !s.selected;
            }
            s
        })
        .collect()
}

/// Deselect everything when all sources are selected, select everything otherwise
pub fn toggled_all(sources: &[Source]) -> Vec<Source> {
    let select = !sources.iter().all(|s| s.selected);
    sources
        .iter()
        .map(|s| Source {
            selected: select,
            ..s.clone()
        })
        .collect()
}

/// Append discovered resources as new, selected sources.
///
/// Ids combine the resource id with the import time so that importing the
/// same resource twice yields two distinct sources.
pub fn with_imported(sources: &[Source], items: &[Resource], now: DateTime<Utc>) -> Vec<Source> {
    let mut taken: HashSet<String> = sources.iter().map(|s| s.id.clone()).collect();
    let stamp = now.timestamp_millis();
    let date_added = now.format("%Y-%m-%d").to_string();

    let imported: Vec<Source> = items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let base = format!("{}-{}-{}", item.id, stamp, idx);
            let mut id = base.clone();
            let mut n = 1;
            while !taken.insert(id.clone()) {
                id = format!("{base}-{n}");
                n += 1;
            }
            Source {
                id,
                title: item.title.clone(),
                source_type: item.resource_type,
                selected: true,
                date_added: date_added.clone(),
            }
        })
        .collect();

    sources.iter().cloned().chain(imported).collect()
}

/// A notebook's sources, kept in step with the backend
pub struct SourceSelection<R> {
    sources: Vec<Source>,
    remote: R,
    events: broadcast::Sender<SyncEvent>,
}

impl<R: RemoteList<Source>> SourceSelection<R> {
    pub fn new(remote: R) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            sources: Vec::new(),
            remote,
            events,
        }
    }

    /// Receive commit progress, including rollbacks
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn selected_count(&self) -> usize {
        self.sources.iter().filter(|s| s.selected).count()
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.sources
            .iter()
            .filter(|s| s.selected)
            .map(|s| s.id.clone())
            .collect()
    }

    /// Replace local state with the backend's list
    pub async fn load(&mut self) -> Result<usize, ApiError> {
        self.sources = self.remote.fetch().await?;
        debug!(total = self.sources.len(), selected = self.selected_count(), "Sources loaded");
        Ok(self.sources.len())
    }

    pub async fn toggle_one(&mut self, id: &str) -> Result<CommitOutcome, SyncError> {
        if !self.sources.iter().any(|s| s.id == id) {
            debug!(id, "Toggle for unknown source ignored");
            return Ok(CommitOutcome::Unchanged);
        }
        let next = toggled_one(&self.sources, id);
        self.synchronize(next).await
    }

    pub async fn toggle_all(&mut self) -> Result<CommitOutcome, SyncError> {
        if self.sources.is_empty() {
            return Ok(CommitOutcome::Unchanged);
        }
        let next = toggled_all(&self.sources);
        self.synchronize(next).await
    }

    pub async fn import_resources(&mut self, items: &[Resource]) -> Result<CommitOutcome, SyncError> {
        self.import_resources_at(items, Utc::now()).await
    }

    async fn import_resources_at(
        &mut self,
        items: &[Resource],
        now: DateTime<Utc>,
    ) -> Result<CommitOutcome, SyncError> {
        if items.is_empty() {
            return Ok(CommitOutcome::Unchanged);
        }
        info!(count = items.len(), "Importing resources");
        let next = with_imported(&self.sources, items, now);
        self.synchronize(next).await
    }

    /// Apply `next` locally and write it back, rolling back on failure
    pub async fn synchronize(&mut self, next: Vec<Source>) -> Result<CommitOutcome, SyncError> {
        optimistic::commit(&mut self.sources, next, &self.remote, &self.events).await
    }
}
