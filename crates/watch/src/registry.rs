// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Watcher Registry: each watcher holds a compiled pattern set and a subscriber list; a
//! single recursive filesystem watch over the workspace root feeds every active watcher, with
//! pattern matching deciding which subscribers see which raw events.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use agent8_core::{ConnectionId, WatcherId};
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult};
use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::error::WatchError;
use crate::patterns::{self, PatternSet};

/// Write-stability debounce window: a file must go quiet for this long before its change is
/// reported.
const STABILITY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChangeKind {
    Change,
    Rename,
}

/// Normalize a raw debounced event per the documented mapping: `add`/`change` collapse to
/// `change`, `unlink`/`unlinkDir` collapse to `rename`.
///
/// `notify-debouncer-mini` coalesces create/modify/remove into a single `DebouncedEventKind`, so
/// the distinction is recovered by checking whether the path still exists once the debounce
/// window has closed: gone means it was removed (`rename`), present means it was created or
/// modified (`change`).
fn normalize(path: &Path) -> FileChangeKind {
    if path.exists() {
        FileChangeKind::Change
    } else {
        FileChangeKind::Rename
    }
}

#[derive(Debug, Clone)]
pub struct WatchEvent {
    pub watcher_id: WatcherId,
    pub event_type: FileChangeKind,
    pub filename: String,
}

struct WatcherRecord {
    patterns: PatternSet,
    subscribers: Arc<RwLock<HashSet<ConnectionId>>>,
}

/// Owns the single underlying filesystem watch and the table of logical watchers layered on top
/// of it. Cloning shares the same watch and table.
pub struct WatcherRegistry {
    workspace: PathBuf,
    watchers: Arc<RwLock<HashMap<WatcherId, WatcherRecord>>>,
    // Kept alive for the registry's lifetime; dropping it stops the underlying OS watch.
    _debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
}

impl WatcherRegistry {
    pub fn new(workspace: PathBuf) -> Result<(Self, mpsc::UnboundedReceiver<WatchEvent>), WatchError> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let watchers: Arc<RwLock<HashMap<WatcherId, WatcherRecord>>> =
            Arc::new(RwLock::new(HashMap::new()));

        let handler_watchers = watchers.clone();
        let handler_workspace = workspace.clone();
        let mut debouncer = new_debouncer(STABILITY, move |result: DebounceEventResult| {
            let Ok(events) = result else { return };
            for event in events {
                let Ok(relative) = event.path.strip_prefix(&handler_workspace) else { continue };
                let relative = relative.to_string_lossy().into_owned();
                let kind = normalize(&event.path);
                for (watcher_id, record) in handler_watchers.read().iter() {
                    if record.subscribers.read().is_empty() {
                        continue;
                    }
                    if record.patterns.matches(&relative) {
                        let _ = events_tx.send(WatchEvent {
                            watcher_id: *watcher_id,
                            event_type: kind,
                            filename: relative.clone(),
                        });
                    }
                }
            }
        })
        .map_err(|e| WatchError::StartFailed(e.to_string()))?;

        debouncer
            .watcher()
            .watch(&workspace, RecursiveMode::Recursive)
            .map_err(|e| WatchError::StartFailed(e.to_string()))?;

        Ok((Self { workspace, watchers, _debouncer: debouncer }, events_rx))
    }

    /// `watch(patterns, persistent)`. `persistent` has no separate implementation here: teardown
    /// already only happens on empty-subscribers or explicit `stop`, which is what a persistent
    /// watcher needs.
    pub fn watch(&self, patterns: &[String], _persistent: bool) -> Result<WatcherId, WatchError> {
        let _initial = patterns::expand(&self.workspace, patterns)?;
        let compiled = PatternSet::compile(patterns, &[])?;
        let id = WatcherId::new();
        self.watchers
            .write()
            .insert(id, WatcherRecord { patterns: compiled, subscribers: Arc::new(RwLock::new(HashSet::new())) });
        Ok(id)
    }

    pub fn watch_paths(
        &self,
        include: &[String],
        exclude: &[String],
    ) -> Result<WatcherId, WatchError> {
        if !include.is_empty() {
            let _initial = patterns::expand(&self.workspace, include)?;
        }
        let compiled = PatternSet::compile(include, exclude)?;
        let id = WatcherId::new();
        self.watchers
            .write()
            .insert(id, WatcherRecord { patterns: compiled, subscribers: Arc::new(RwLock::new(HashSet::new())) });
        Ok(id)
    }

    pub fn subscribe(&self, watcher_id: WatcherId, connection: ConnectionId) -> Result<(), WatchError> {
        let watchers = self.watchers.read();
        let record = watchers.get(&watcher_id).ok_or(WatchError::NotFound)?;
        record.subscribers.write().insert(connection);
        Ok(())
    }

    /// Remove `connection` from every watcher's subscriber set, closing (removing) any watcher
    /// whose set becomes empty as a result.
    pub fn unsubscribe_connection(&self, connection: ConnectionId) {
        let mut to_remove = Vec::new();
        {
            let watchers = self.watchers.read();
            for (id, record) in watchers.iter() {
                let mut subs = record.subscribers.write();
                subs.remove(&connection);
                if subs.is_empty() {
                    to_remove.push(*id);
                }
            }
        }
        let mut watchers = self.watchers.write();
        for id in to_remove {
            watchers.remove(&id);
        }
    }

    /// Explicit `stop(watcherId)`: removes the record regardless of remaining subscribers.
    pub fn stop(&self, watcher_id: WatcherId) -> Result<(), WatchError> {
        self.watchers.write().remove(&watcher_id).map(|_| ()).ok_or(WatchError::NotFound)
    }

    /// Remove every watcher record. Used on gateway shutdown; the underlying OS watch itself is
    /// only released when `self` (and its `_debouncer`) is dropped.
    pub fn stop_all(&self) {
        self.watchers.write().clear();
    }

    /// Look up an existing watcher whose compiled pattern set matches `include`/`exclude`
    /// exactly, so a second client requesting the same patterns joins the same record instead of
    /// starting a duplicate OS watch.
    pub fn find_by_patterns(&self, include: &[String], exclude: &[String]) -> Option<WatcherId> {
        self.watchers
            .read()
            .iter()
            .find(|(_, record)| record.patterns.matches_spec(include, exclude))
            .map(|(id, _)| *id)
    }

    /// Snapshot of the connections currently subscribed to `watcher_id`. Used by the gateway to
    /// decide which connections a `WatchEvent` should be forwarded to; empty if unknown.
    pub fn subscribers(&self, watcher_id: WatcherId) -> HashSet<ConnectionId> {
        self.watchers.read().get(&watcher_id).map(|record| record.subscribers.read().clone()).unwrap_or_default()
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
