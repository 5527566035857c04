//! The flow store
//!
//! Owns the documents root and the current flow listing. Every lifecycle
//! operation re-enumerates on success so subscribers always see the state on
//! disk. Failures are returned to the caller and logged once here.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use flowdeck_core::{
    default_flow_name, validate_flow_name, FlowDocument, FlowEntry, FlowGraphDocument,
    FlowLayout, FlowMetadata, FlowdeckConfig, FlowdeckError, FlowdeckResult, SettingsDocument,
    FLOW_FILE, SETTINGS_FILE,
};
use tokio::sync::{mpsc, watch, Mutex};
use toml::{Table, Value};
use tracing::{debug, info, warn};

use crate::fs::{is_cross_device, path_exists, read_document, scan_flows, write_atomic};
use crate::watcher::{FlowWatcher, WatchBatch, WatchHandle};

/// How a rename was carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameStrategy {
    /// Single `rename(2)` of the flow directory
    Atomic,
    /// Create new directory, copy both documents, remove the old directory.
    ///
    /// Not transactional: an interruption after the copy leaves both
    /// directories, an interruption during the copy leaves a partial new
    /// directory next to the intact old one.
    CopyThenDelete,
}

/// Log a failed operation and hand the error back
fn logged<T>(op: &str, result: FlowdeckResult<T>) -> FlowdeckResult<T> {
    if let Err(ref e) = result {
        warn!("{} failed: {}", op, e);
    }
    result
}

/// File-backed store of flows under `<documents-root>/flows`
#[derive(Debug)]
pub struct FlowStore {
    layout: FlowLayout,
    author: String,
    listing: watch::Sender<Vec<FlowEntry>>,
    /// Serializes read-modify-write cycles on documents
    write_lock: Mutex<()>,
}

impl FlowStore {
    pub fn new(layout: FlowLayout) -> Self {
        Self::with_author(layout, flowdeck_core::flow::DEFAULT_AUTHOR)
    }

    pub fn with_author(layout: FlowLayout, author: impl Into<String>) -> Self {
        let (listing, _) = watch::channel(Vec::new());
        Self {
            layout,
            author: author.into(),
            listing,
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &FlowdeckConfig) -> Self {
        Self::with_author(config.layout(), config.author.clone())
    }

    /// Create the store and load the initial listing
    pub async fn open(layout: FlowLayout) -> FlowdeckResult<Self> {
        let store = Self::new(layout);
        store.refresh().await?;
        Ok(store)
    }

    pub fn layout(&self) -> &FlowLayout {
        &self.layout
    }

    /// The most recently published listing
    pub fn flows(&self) -> Vec<FlowEntry> {
        self.listing.borrow().clone()
    }

    /// Receive every listing the store publishes
    pub fn subscribe(&self) -> watch::Receiver<Vec<FlowEntry>> {
        self.listing.subscribe()
    }

    async fn scan(&self) -> FlowdeckResult<Vec<FlowEntry>> {
        let flows_dir = self.layout.flows_dir();
        tokio::task::spawn_blocking(move || scan_flows(&flows_dir))
            .await
            .map_err(|e| {
                FlowdeckError::io(
                    self.layout.flows_dir(),
                    std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
                )
            })?
    }

    /// Enumerate flows and publish the listing
    ///
    /// On failure the previous listing stays published.
    pub async fn refresh(&self) -> FlowdeckResult<Vec<FlowEntry>> {
        let flows = logged("enumerate flows", self.scan().await)?;
        debug!("Enumerated {} flows", flows.len());
        self.listing.send_replace(flows.clone());
        Ok(flows)
    }

    /// Create `Flow <N+1>` (or the next free number) with default documents
    pub async fn create_flow(&self) -> FlowdeckResult<FlowMetadata> {
        let meta = logged("create flow", self.create_flow_inner().await)?;
        self.refresh().await?;
        Ok(meta)
    }

    async fn create_flow_inner(&self) -> FlowdeckResult<FlowMetadata> {
        let existing = self.scan().await?;
        let flows_dir = self.layout.flows_dir();
        tokio::fs::create_dir_all(&flows_dir)
            .await
            .map_err(|e| FlowdeckError::io(&flows_dir, e))?;

        let mut n = existing.len() + 1;
        let name = loop {
            let candidate = default_flow_name(n);
            let dir = self.layout.flow_dir(&candidate);
            match tokio::fs::create_dir(&dir).await {
                Ok(()) => break candidate,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!("{} already exists, trying next name", candidate);
                    n += 1;
                }
                Err(e) => return Err(FlowdeckError::io(&dir, e)),
            }
        };

        let meta = FlowMetadata::new(&name, &self.author);
        info!("Creating flow '{}' ({})", name, meta.id);

        write_atomic(&self.layout.flow_file(&name), &FlowDocument::new_flow(&meta)?).await?;
        write_atomic(
            &self.layout.settings_file(&name),
            &SettingsDocument::default().to_toml_string()?,
        )
        .await?;

        Ok(meta)
    }

    /// Recursively remove a flow directory
    pub async fn delete_flow(&self, flow_name: &str) -> FlowdeckResult<()> {
        logged("delete flow", self.delete_flow_inner(flow_name).await)?;
        self.refresh().await?;
        Ok(())
    }

    async fn delete_flow_inner(&self, flow_name: &str) -> FlowdeckResult<()> {
        validate_flow_name(flow_name)?;
        let dir = self.layout.flow_dir(flow_name);
        if !path_exists(&dir).await? {
            return Err(FlowdeckError::not_found(format!("flow '{}' does not exist", flow_name)));
        }
        info!("Deleting flow '{}'", flow_name);
        tokio::fs::remove_dir_all(&dir)
            .await
            .map_err(|e| FlowdeckError::io(&dir, e))
    }

    /// Move a flow to a new name
    ///
    /// Both documents must exist under the old name and the new name must be
    /// free. Tries an atomic directory rename first and falls back to
    /// copy-then-delete when the platform refuses it.
    pub async fn rename_flow(&self, flow_name: &str, new_name: &str) -> FlowdeckResult<RenameStrategy> {
        let strategy = logged("rename flow", self.rename_flow_inner(flow_name, new_name).await)?;
        self.refresh().await?;
        Ok(strategy)
    }

    async fn rename_flow_inner(&self, flow_name: &str, new_name: &str) -> FlowdeckResult<RenameStrategy> {
        validate_flow_name(flow_name)?;
        validate_flow_name(new_name)?;
        if flow_name == new_name {
            return Err(FlowdeckError::invalid_input("flow names are the same"));
        }

        for doc in [self.layout.flow_file(flow_name), self.layout.settings_file(flow_name)] {
            if !path_exists(&doc).await? {
                return Err(FlowdeckError::not_found(format!(
                    "flow '{}' is missing {}",
                    flow_name,
                    doc.display()
                )));
            }
        }

        let old_dir = self.layout.flow_dir(flow_name);
        let new_dir = self.layout.flow_dir(new_name);
        if path_exists(&new_dir).await? {
            return Err(FlowdeckError::already_exists(format!(
                "flow '{}' already exists",
                new_name
            )));
        }

        info!("Renaming flow '{}' to '{}'", flow_name, new_name);
        match tokio::fs::rename(&old_dir, &new_dir).await {
            Ok(()) => Ok(RenameStrategy::Atomic),
            Err(e) if is_cross_device(&e) => {
                warn!("Atomic rename not possible ({}); copying instead", e);
                self.rename_by_copy(flow_name, new_name).await?;
                Ok(RenameStrategy::CopyThenDelete)
            }
            Err(e) => Err(FlowdeckError::io(&old_dir, e)),
        }
    }

    pub(crate) async fn rename_by_copy(&self, flow_name: &str, new_name: &str) -> FlowdeckResult<()> {
        let new_dir = self.layout.flow_dir(new_name);
        tokio::fs::create_dir_all(&new_dir)
            .await
            .map_err(|e| FlowdeckError::io(&new_dir, e))?;

        for file in [FLOW_FILE, SETTINGS_FILE] {
            let from = self.layout.flow_dir(flow_name).join(file);
            let to = new_dir.join(file);
            tokio::fs::copy(&from, &to)
                .await
                .map_err(|e| FlowdeckError::io(&from, e))?;
        }

        let old_dir = self.layout.flow_dir(flow_name);
        tokio::fs::remove_dir_all(&old_dir)
            .await
            .map_err(|e| FlowdeckError::io(&old_dir, e))
    }

    async fn load_document(&self, flow_name: &str) -> FlowdeckResult<FlowDocument> {
        validate_flow_name(flow_name)?;
        let path = self.layout.flow_file(flow_name);
        let text = read_document(&path).await?;
        FlowDocument::parse(flow_name, &path, &text)
    }

    async fn store_document(&self, doc: &FlowDocument) -> FlowdeckResult<()> {
        write_atomic(doc.path(), &doc.to_toml_string()?).await
    }

    /// Raw flow.toml text
    pub async fn read_flow_source(&self, flow_name: &str) -> FlowdeckResult<String> {
        let result = async {
            validate_flow_name(flow_name)?;
            read_document(&self.layout.flow_file(flow_name)).await
        }
        .await;
        logged("read flow document", result)
    }

    pub async fn read_metadata(&self, flow_name: &str) -> FlowdeckResult<FlowMetadata> {
        let result = async { self.load_document(flow_name).await?.metadata() }.await;
        logged("read flow metadata", result)
    }

    /// The node table whose `id` equals `node_id`
    pub async fn read_node_config(&self, flow_name: &str, node_id: &str) -> FlowdeckResult<Table> {
        debug!("Reading node '{}' of flow '{}'", node_id, flow_name);
        let result = async { self.load_document(flow_name).await?.node(node_id) }.await;
        logged("read node config", result)
    }

    /// Replace the `data` of one node and rewrite flow.toml
    pub async fn write_node_config(&self, flow_name: &str, node_id: &str, data: Value) -> FlowdeckResult<()> {
        debug!("Writing node '{}' of flow '{}'", node_id, flow_name);
        let result = async {
            let _guard = self.write_lock.lock().await;
            let mut doc = self.load_document(flow_name).await?;
            doc.set_node_data(node_id, data)?;
            self.store_document(&doc).await
        }
        .await;
        logged("write node config", result)
    }

    pub async fn load_graph(&self, flow_name: &str) -> FlowdeckResult<FlowGraphDocument> {
        let result = async { self.load_document(flow_name).await?.graph() }.await;
        logged("load graph", result)
    }

    /// Replace the `nodes` and `edges` of a flow, keeping everything else
    pub async fn save_graph(&self, flow_name: &str, graph: &FlowGraphDocument) -> FlowdeckResult<()> {
        let result = async {
            let _guard = self.write_lock.lock().await;
            let mut doc = self.load_document(flow_name).await?;
            doc.set_graph(graph)?;
            self.store_document(&doc).await
        }
        .await;
        logged("save graph", result)
    }

    pub async fn read_settings(&self, flow_name: &str) -> FlowdeckResult<SettingsDocument> {
        let result = async {
            validate_flow_name(flow_name)?;
            let path = self.layout.settings_file(flow_name);
            SettingsDocument::parse(&path, &read_document(&path).await?)
        }
        .await;
        logged("read settings", result)
    }

    pub async fn write_settings(&self, flow_name: &str, settings: &SettingsDocument) -> FlowdeckResult<()> {
        let result = async {
            validate_flow_name(flow_name)?;
            let path = self.layout.settings_file(flow_name);
            if !path_exists(&self.layout.flow_dir(flow_name)).await? {
                return Err(FlowdeckError::not_found(format!("flow '{}' does not exist", flow_name)));
            }
            let _guard = self.write_lock.lock().await;
            write_atomic(&path, &settings.to_toml_string()?).await
        }
        .await;
        logged("write settings", result)
    }

    /// Watch the documents root and re-enumerate after every batch of changes
    ///
    /// Batches are forwarded on the returned receiver after the listing has
    /// been refreshed. The watch ends when the handle is dropped.
    pub async fn watch(
        self: &Arc<Self>,
        poll_interval: Duration,
    ) -> FlowdeckResult<(WatchHandle, mpsc::Receiver<WatchBatch>)> {
        let root = self.layout.documents_root().to_path_buf();
        let (handle, mut batches) = logged(
            "watch documents root",
            FlowWatcher::new(root, poll_interval).spawn().await,
        )?;

        let (tx, rx) = mpsc::channel(32);
        let store = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(batch) = batches.recv().await {
                debug!("File change batch of {} event(s)", batch.len());
                // refresh logs its own failure and keeps the old listing
                let _ = store.refresh().await;
                if tx.try_send(batch).is_err() {
                    debug!("Dropping change batch; no consumer ready");
                }
            }
        });

        Ok((handle, rx))
    }
}

/// True if `path` is one of a flow's two documents
pub fn is_flow_document(path: &Path) -> bool {
    matches!(
        path.file_name().and_then(|n| n.to_str()),
        Some(FLOW_FILE) | Some(SETTINGS_FILE)
    )
}
