//! Polling change watcher for the documents root
//!
//! Every tick the watcher walks the root, records `(size, mtime)` per path,
//! and diffs the result against the previous snapshot. All changes found in
//! one tick are delivered together as a single batch, so a burst of writes
//! costs one listing refresh per tick rather than one per file.
//!
//! The watch stops when its [`WatchHandle`] is cancelled or dropped, when the
//! receiver goes away, or when the root becomes unavailable. It is never
//! restarted automatically.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use flowdeck_core::{FlowdeckError, FlowdeckResult};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use walkdir::WalkDir;

/// What happened to a path between two snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchEventKind {
    Created,
    Modified,
    Removed,
}

/// A single observed change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    pub path: PathBuf,
}

/// Changes observed during one poll
pub type WatchBatch = Vec<WatchEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    len: u64,
    modified: Option<SystemTime>,
}

#[derive(Debug, Default, Clone)]
struct Snapshot {
    entries: HashMap<PathBuf, FileStamp>,
}

impl Snapshot {
    /// Walk `root`; fails if the root itself cannot be read
    fn capture(root: &Path) -> FlowdeckResult<Self> {
        let mut entries = HashMap::new();
        for entry in WalkDir::new(root).min_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                // Entries vanishing mid-walk are normal; a missing root is not
                Err(e) if e.depth() > 0 => continue,
                Err(e) => {
                    return Err(FlowdeckError::watch(format!(
                        "cannot read {}: {}",
                        root.display(),
                        e
                    )))
                }
            };
            let Ok(meta) = entry.metadata() else { continue };
            let stamp = FileStamp {
                len: if meta.is_dir() { 0 } else { meta.len() },
                modified: meta.modified().ok(),
            };
            entries.insert(entry.into_path(), stamp);
        }

        if entries.is_empty() && !root.is_dir() {
            return Err(FlowdeckError::watch(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        Ok(Self { entries })
    }

    fn diff(&self, newer: &Snapshot) -> WatchBatch {
        let mut events: WatchBatch = Vec::new();

        for (path, stamp) in &newer.entries {
            match self.entries.get(path) {
                None => events.push(WatchEvent {
                    kind: WatchEventKind::Created,
                    path: path.clone(),
                }),
                Some(old) if old != stamp => events.push(WatchEvent {
                    kind: WatchEventKind::Modified,
                    path: path.clone(),
                }),
                Some(_) => {}
            }
        }
        for path in self.entries.keys() {
            if !newer.entries.contains_key(path) {
                events.push(WatchEvent {
                    kind: WatchEventKind::Removed,
                    path: path.clone(),
                });
            }
        }

        events.sort_by(|a, b| a.path.cmp(&b.path));
        events
    }
}

async fn capture(root: PathBuf) -> FlowdeckResult<Snapshot> {
    tokio::task::spawn_blocking(move || Snapshot::capture(&root))
        .await
        .map_err(|e| FlowdeckError::watch(format!("snapshot task failed: {}", e)))?
}

/// Polls a directory tree for changes
#[derive(Debug, Clone)]
pub struct FlowWatcher {
    root: PathBuf,
    poll_interval: Duration,
}

impl FlowWatcher {
    pub fn new(root: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        Self {
            root: root.into(),
            poll_interval,
        }
    }

    /// Start watching. Batches arrive on the returned receiver.
    ///
    /// Fails immediately if the root cannot be read.
    pub async fn spawn(self) -> FlowdeckResult<(WatchHandle, mpsc::Receiver<WatchBatch>)> {
        let initial = capture(self.root.clone()).await?;
        let (tx, rx) = mpsc::channel(32);
        let token = CancellationToken::new();

        info!("Watching {} for changes", self.root.display());
        let task = tokio::spawn(self.run(initial, tx, token.clone()));

        Ok((
            WatchHandle {
                token,
                task: Some(task),
            },
            rx,
        ))
    }

    async fn run(self, mut previous: Snapshot, tx: mpsc::Sender<WatchBatch>, token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Watch on {} cancelled", self.root.display());
                    break;
                }
                _ = ticker.tick() => {}
            }

            let current = match capture(self.root.clone()).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    error!("Stopping watch on {}: {}", self.root.display(), e);
                    break;
                }
            };

            let batch = previous.diff(&current);
            previous = current;
            if batch.is_empty() {
                continue;
            }

            debug!("{} change(s) under {}", batch.len(), self.root.display());
            if tx.send(batch).await.is_err() {
                debug!("Watch receiver dropped; stopping");
                break;
            }
        }
    }
}

/// Owns a running watch; dropping it stops the watch
#[derive(Debug)]
pub struct WatchHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl WatchHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancel and wait for the watch task to exit
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
