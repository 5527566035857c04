//! Flow lifecycle: create, delete, rename

use anyhow::{Context, Result};

use flowdeck_store::{FlowStore, RenameStrategy};

use crate::output::{success, warning};

pub async fn create(store: &FlowStore) -> Result<()> {
    let meta = store.create_flow().await.context("Failed to create flow")?;
    success(&format!("flow/{} created (id {})", meta.name, meta.id));
    Ok(())
}

pub async fn delete(store: &FlowStore, name: &str) -> Result<()> {
    store
        .delete_flow(name)
        .await
        .with_context(|| format!("Failed to delete flow '{}'", name))?;
    success(&format!("flow/{} deleted", name));
    Ok(())
}

pub async fn rename(store: &FlowStore, name: &str, new_name: &str) -> Result<()> {
    let strategy = store
        .rename_flow(name, new_name)
        .await
        .with_context(|| format!("Failed to rename flow '{}' to '{}'", name, new_name))?;
    if strategy == RenameStrategy::CopyThenDelete {
        warning("flows directory spans devices; documents were copied");
    }
    success(&format!("flow/{} renamed to flow/{}", name, new_name));
    Ok(())
}
