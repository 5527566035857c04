//! File-system helpers shared by the store and the watcher

use flowdeck_core::{is_junk_entry, FlowEntry, FlowdeckError, FlowdeckResult};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Read a UTF-8 document, mapping a missing file to `NotFound`
pub(crate) async fn read_document(path: &Path) -> FlowdeckResult<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            FlowdeckError::not_found(format!("{} does not exist", path.display()))
        } else {
            FlowdeckError::io(path, e)
        }
    })
}

/// Write `contents` to a sibling temp file and rename it over `path`
///
/// Readers see either the old or the new document, never a truncated one.
pub(crate) async fn write_atomic(path: &Path, contents: &str) -> FlowdeckResult<()> {
    let dir = path
        .parent()
        .ok_or_else(|| FlowdeckError::invalid_input(format!("{} has no parent", path.display())))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document");
    let tmp = dir.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4().simple()));

    tokio::fs::write(&tmp, contents)
        .await
        .map_err(|e| FlowdeckError::io(&tmp, e))?;

    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(FlowdeckError::io(path, e));
    }
    Ok(())
}

pub(crate) async fn path_exists(path: &Path) -> FlowdeckResult<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| FlowdeckError::io(path, e))
}

/// True when `rename(2)` failed only because source and target live on
/// different devices
pub(crate) fn is_cross_device(e: &io::Error) -> bool {
    #[cfg(unix)]
    const EXDEV: i32 = 18;
    #[cfg(windows)]
    const EXDEV: i32 = 17; // ERROR_NOT_SAME_DEVICE
    #[cfg(not(any(unix, windows)))]
    const EXDEV: i32 = -1;

    e.raw_os_error() == Some(EXDEV)
}

fn walk_error(e: walkdir::Error, fallback: &Path) -> FlowdeckError {
    let path = e.path().unwrap_or(fallback).to_path_buf();
    let io_err = e
        .into_io_error()
        .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "filesystem loop detected"));
    FlowdeckError::io(path, io_err)
}

/// List every flow directory under `flows_dir`, junk entries removed
///
/// Blocking; run it on the blocking pool.
pub(crate) fn scan_flows(flows_dir: &Path) -> FlowdeckResult<Vec<FlowEntry>> {
    if !flows_dir.exists() {
        return Ok(Vec::new());
    }

    let mut flows = Vec::new();
    let entries = std::fs::read_dir(flows_dir).map_err(|e| FlowdeckError::io(flows_dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| FlowdeckError::io(flows_dir, e))?;
        let path = entry.path();
        if is_junk_entry(&path) || !path.is_dir() {
            continue;
        }

        let mut children: Vec<PathBuf> = Vec::new();
        for child in WalkDir::new(&path)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| !is_junk_entry(e.path()))
        {
            let child = child.map_err(|e| walk_error(e, &path))?;
            children.push(child.into_path());
        }
        children.sort();

        let modified = entry.metadata().ok().and_then(|m| m.modified().ok());
        flows.push(FlowEntry {
            name: entry.file_name().to_string_lossy().to_string(),
            path,
            children,
            modified,
        });
    }

    flows.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(flows)
}
