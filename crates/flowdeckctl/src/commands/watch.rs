use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use flowdeck_core::FlowEntry;
use flowdeck_store::{is_flow_document, FlowStore, WatchEvent, WatchEventKind};
use flowdeck_viz::{FlowListRenderer, RenderConfig};

use crate::output::{dim, render_config};

/// Print change batches and the refreshed listing until Ctrl-C
pub async fn execute(store: FlowStore, poll_interval: Duration) -> Result<()> {
    let flows_dir = store.layout().flows_dir();
    tokio::fs::create_dir_all(&flows_dir)
        .await
        .with_context(|| format!("Failed to create {}", flows_dir.display()))?;

    let store = Arc::new(store);
    let (handle, mut batches) = store
        .watch(poll_interval)
        .await
        .context("Failed to start watching")?;

    let config = render_config();
    println!(
        "Watching {} ({} flows). Press Ctrl-C to stop.",
        store.layout().documents_root().display(),
        store.flows().len()
    );
    println!("{}", listing(&store.flows(), &config));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            batch = batches.recv() => {
                let Some(batch) = batch else {
                    eprintln!("Watch stopped: documents root is no longer available");
                    break;
                };
                let root = store.layout().documents_root();
                for event in &batch {
                    println!("{}", describe(event, root));
                }
                println!("{}", dim(&listing(&store.flows(), &config)));
            }
        }
    }

    handle.stop().await;
    Ok(())
}

fn listing(flows: &[FlowEntry], config: &RenderConfig) -> String {
    FlowListRenderer::new(config.clone()).render(flows, None)
}

fn describe(event: &WatchEvent, root: &Path) -> String {
    let kind = match event.kind {
        WatchEventKind::Created => "created",
        WatchEventKind::Modified => "modified",
        WatchEventKind::Removed => "removed",
    };
    let path = event.path.strip_prefix(root).unwrap_or(&event.path);
    let marker = if is_flow_document(&event.path) { "*" } else { " " };
    format!("{} {:<8} {}", marker, kind, path.display())
}
