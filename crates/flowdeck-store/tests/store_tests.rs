//! Flow Store Integration Tests
//!
//! Exercises the store against a real temporary documents root:
//! - flow creation naming and default documents
//! - rename success and rejected renames
//! - node configuration round-trips and failed lookups
//! - deletion, junk filtering and concurrent writes
//! - watch-driven listing refresh

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use flowdeck_core::{
    json_to_toml, ErrorKind, FlowDocument, FlowLayout, SettingsDocument, FLOW_FILE, SETTINGS_FILE,
};
use flowdeck_store::{FlowStore, RenameStrategy};
use serde_json::json;
use tempfile::{tempdir, TempDir};
use toml::Value;

/// Create a store rooted in a fresh temp directory
fn create_test_store() -> (FlowStore, TempDir) {
    let dir = tempdir().unwrap();
    let store = FlowStore::new(FlowLayout::new(dir.path()));
    (store, dir)
}

/// Append nodes to a flow's metadata document
fn add_nodes(store: &FlowStore, flow: &str, ids: &[&str]) {
    let path = store.layout().flow_file(flow);
    let mut text = std::fs::read_to_string(&path).unwrap();
    for id in ids {
        text.push_str(&format!(
            "\n[[nodes]]\nid = \"{}\"\ntype = \"pythonNode\"\n\n[nodes.data]\ntitle = \"Python\"\n",
            id
        ));
    }
    std::fs::write(&path, text).unwrap();
}

fn dir_names(path: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(path)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

// ============================================================================
// Creation
// ============================================================================

#[tokio::test]
async fn test_create_flow_names_from_count() {
    let (store, _dir) = create_test_store();

    for expected in ["Flow 1", "Flow 2", "Flow 3"] {
        let meta = store.create_flow().await.unwrap();
        assert_eq!(meta.name, expected);
    }

    let names: Vec<_> = store.flows().into_iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["Flow 1", "Flow 2", "Flow 3"]);
}

#[tokio::test]
async fn test_create_flow_writes_two_default_documents() {
    let (store, _dir) = create_test_store();
    let meta = store.create_flow().await.unwrap();

    let flow_dir = store.layout().flow_dir("Flow 1");
    assert_eq!(dir_names(&flow_dir), vec![FLOW_FILE, SETTINGS_FILE]);

    let text = std::fs::read_to_string(store.layout().flow_file("Flow 1")).unwrap();
    let doc = FlowDocument::parse("Flow 1", "flow.toml", &text).unwrap();
    let stored = doc.metadata().unwrap();
    assert_eq!(stored, meta);
    assert_eq!(stored.version, "0.0.1");
    assert_eq!(stored.author, "Your Name <your.email@example.com>");
    assert_eq!(stored.description, "Description of your flow");
    assert!(uuid::Uuid::parse_str(&stored.id).is_ok());

    let settings = store.read_settings("Flow 1").await.unwrap();
    assert_eq!(settings, SettingsDocument::default());
}

#[tokio::test]
async fn test_create_flow_ids_are_unique() {
    let (store, _dir) = create_test_store();
    let a = store.create_flow().await.unwrap();
    let b = store.create_flow().await.unwrap();
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn test_create_uses_configured_author() {
    let dir = tempdir().unwrap();
    let store = FlowStore::with_author(FlowLayout::new(dir.path()), "Ada <ada@example.com>");
    let meta = store.create_flow().await.unwrap();
    assert_eq!(store.read_metadata(&meta.name).await.unwrap().author, "Ada <ada@example.com>");
}

// ============================================================================
// Rename
// ============================================================================

#[tokio::test]
async fn test_rename_moves_identical_documents() {
    let (store, _dir) = create_test_store();
    store.create_flow().await.unwrap();
    add_nodes(&store, "Flow 1", &["n1"]);

    let flow_before = std::fs::read(store.layout().flow_file("Flow 1")).unwrap();
    let settings_before = std::fs::read(store.layout().settings_file("Flow 1")).unwrap();

    let strategy = store.rename_flow("Flow 1", "Renamed").await.unwrap();
    assert_eq!(strategy, RenameStrategy::Atomic);

    assert!(!store.layout().flow_dir("Flow 1").exists());
    assert_eq!(std::fs::read(store.layout().flow_file("Renamed")).unwrap(), flow_before);
    assert_eq!(
        std::fs::read(store.layout().settings_file("Renamed")).unwrap(),
        settings_before
    );

    let names: Vec<_> = store.flows().into_iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["Renamed"]);
}

#[tokio::test]
async fn test_rename_with_missing_document_changes_nothing() {
    let (store, dir) = create_test_store();
    store.create_flow().await.unwrap();
    std::fs::remove_file(store.layout().settings_file("Flow 1")).unwrap();

    let err = store.rename_flow("Flow 1", "Renamed").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert_eq!(dir_names(&dir.path().join("flows")), vec!["Flow 1"]);
    assert_eq!(dir_names(&store.layout().flow_dir("Flow 1")), vec![FLOW_FILE]);
}

#[tokio::test]
async fn test_rename_to_same_name_is_rejected() {
    let (store, _dir) = create_test_store();
    store.create_flow().await.unwrap();

    let err = store.rename_flow("Flow 1", "Flow 1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(store.layout().flow_file("Flow 1").exists());
}

#[tokio::test]
async fn test_rename_rejects_path_names() {
    let (store, _dir) = create_test_store();
    store.create_flow().await.unwrap();

    let err = store.rename_flow("Flow 1", "../escape").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

// ============================================================================
// Node configuration
// ============================================================================

#[tokio::test]
async fn test_write_then_read_node_config() {
    let (store, _dir) = create_test_store();
    store.create_flow().await.unwrap();
    add_nodes(&store, "Flow 1", &["n1", "n2"]);

    let data = json_to_toml(json!({
        "title": "Summarize",
        "code": "print('hi')",
        "inputs": ["a", "b"],
        "limits": {"timeout": 30}
    }))
    .unwrap();
    store.write_node_config("Flow 1", "n1", data.clone()).await.unwrap();

    let node = store.read_node_config("Flow 1", "n1").await.unwrap();
    assert_eq!(node["data"], data);
    assert_eq!(node["type"].as_str(), Some("pythonNode"));

    // Untouched neighbour
    let other = store.read_node_config("Flow 1", "n2").await.unwrap();
    assert_eq!(other["data"]["title"].as_str(), Some("Python"));

    // Metadata survives the rewrite
    assert_eq!(store.read_metadata("Flow 1").await.unwrap().name, "Flow 1");
}

#[tokio::test]
async fn test_absent_node_fails_without_mutation() {
    let (store, _dir) = create_test_store();
    store.create_flow().await.unwrap();
    add_nodes(&store, "Flow 1", &["n1"]);
    let before = std::fs::read(store.layout().flow_file("Flow 1")).unwrap();

    let read_err = store.read_node_config("Flow 1", "ghost").await.unwrap_err();
    assert_eq!(read_err.kind(), ErrorKind::NotFound);

    let write_err = store
        .write_node_config("Flow 1", "ghost", Value::String("x".into()))
        .await
        .unwrap_err();
    assert_eq!(write_err.kind(), ErrorKind::NotFound);

    assert_eq!(std::fs::read(store.layout().flow_file("Flow 1")).unwrap(), before);
}

#[tokio::test]
async fn test_node_config_preconditions() {
    let (store, _dir) = create_test_store();
    store.create_flow().await.unwrap();

    // Fresh flows have no nodes list
    let err = store.read_node_config("Flow 1", "n1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // Missing flow
    let err = store.read_node_config("Nope", "n1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // Empty node id
    add_nodes(&store, "Flow 1", &["n1"]);
    let err = store.read_node_config("Flow 1", "").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn test_duplicate_node_ids_fail_loudly() {
    let (store, _dir) = create_test_store();
    store.create_flow().await.unwrap();
    add_nodes(&store, "Flow 1", &["twin", "twin"]);
    let before = std::fs::read(store.layout().flow_file("Flow 1")).unwrap();

    let err = store.read_node_config("Flow 1", "twin").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateNodeId);

    let err = store
        .write_node_config("Flow 1", "twin", Value::Boolean(true))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateNodeId);
    assert_eq!(std::fs::read(store.layout().flow_file("Flow 1")).unwrap(), before);
}

#[tokio::test]
async fn test_malformed_document_is_reported() {
    let (store, _dir) = create_test_store();
    store.create_flow().await.unwrap();
    std::fs::write(store.layout().flow_file("Flow 1"), "[flow\nname = ").unwrap();

    let err = store.read_node_config("Flow 1", "n1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Malformed);
}

#[tokio::test]
async fn test_concurrent_writes_keep_document_parseable() {
    let (store, _dir) = create_test_store();
    store.create_flow().await.unwrap();
    add_nodes(&store, "Flow 1", &["n1"]);
    let store = Arc::new(store);

    let mut tasks = Vec::new();
    for i in 0..16 {
        let store = Arc::clone(&store);
        tasks.push(tokio::spawn(async move {
            let data = json_to_toml(json!({"title": "Python", "run": i})).unwrap();
            store.write_node_config("Flow 1", "n1", data).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let node = store.read_node_config("Flow 1", "n1").await.unwrap();
    let run = node["data"]["run"].as_integer().unwrap();
    assert!((0..16).contains(&run));

    let text = std::fs::read_to_string(store.layout().flow_file("Flow 1")).unwrap();
    assert!(FlowDocument::parse("Flow 1", "flow.toml", &text).is_ok());
}

// ============================================================================
// Delete & enumeration
// ============================================================================

#[tokio::test]
async fn test_delete_removes_subtree() {
    let (store, _dir) = create_test_store();
    store.create_flow().await.unwrap();
    store.create_flow().await.unwrap();
    std::fs::create_dir_all(store.layout().flow_dir("Flow 1").join("assets/deep")).unwrap();

    store.delete_flow("Flow 1").await.unwrap();

    assert!(!store.layout().flow_dir("Flow 1").exists());
    let names: Vec<_> = store.refresh().await.unwrap().into_iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["Flow 2"]);
}

#[tokio::test]
async fn test_delete_missing_flow() {
    let (store, _dir) = create_test_store();
    let err = store.delete_flow("Flow 9").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_enumeration_filters_housekeeping_entries() {
    let (store, dir) = create_test_store();
    store.create_flow().await.unwrap();

    let flows = dir.path().join("flows");
    std::fs::write(flows.join(".DS_Store"), "junk").unwrap();
    std::fs::write(flows.join("Flow 1").join(".DS_Store"), "junk").unwrap();
    std::fs::write(flows.join("Flow 1").join("Thumbs.db"), "junk").unwrap();

    let listing = store.refresh().await.unwrap();
    assert_eq!(listing.len(), 1);
    for child in &listing[0].children {
        let name = child.file_name().unwrap().to_string_lossy();
        assert!(name != ".DS_Store" && name != "Thumbs.db", "junk leaked: {}", name);
    }
}

// ============================================================================
// Graph persistence
// ============================================================================

#[tokio::test]
async fn test_save_graph_round_trip() {
    let (store, _dir) = create_test_store();
    store.create_flow().await.unwrap();
    add_nodes(&store, "Flow 1", &["a", "b"]);

    let mut graph = store.load_graph("Flow 1").await.unwrap();
    assert_eq!(graph.nodes.len(), 2);
    assert!(graph.edges.is_empty());

    graph.edges.push(flowdeck_core::GraphEdge::new("a", "b"));
    store.save_graph("Flow 1", &graph).await.unwrap();

    assert_eq!(store.load_graph("Flow 1").await.unwrap(), graph);
    assert_eq!(store.read_metadata("Flow 1").await.unwrap().name, "Flow 1");
}

// ============================================================================
// Watch
// ============================================================================

#[tokio::test]
async fn test_external_change_refreshes_listing() {
    let dir = tempdir().unwrap();
    let store = Arc::new(FlowStore::new(FlowLayout::new(dir.path())));
    store.create_flow().await.unwrap();

    let (handle, mut batches) = store.watch(Duration::from_millis(20)).await.unwrap();
    let mut listing = store.subscribe();
    listing.borrow_and_update();

    // Another process adds a flow behind our back
    let external = store.layout().flow_dir("External");
    std::fs::create_dir_all(&external).unwrap();
    std::fs::write(external.join(FLOW_FILE), "[flow]\nname = \"External\"\n").unwrap();

    tokio::time::timeout(Duration::from_secs(5), batches.recv())
        .await
        .expect("no change batch")
        .expect("watch ended");

    let names: Vec<_> = listing.borrow_and_update().iter().map(|f| f.name.clone()).collect();
    assert!(names.contains(&"External".to_string()));

    handle.stop().await;
}

#[tokio::test]
async fn test_changes_within_one_tick_arrive_as_one_batch() {
    let dir = tempdir().unwrap();
    let store = Arc::new(FlowStore::new(FlowLayout::new(dir.path().join("docs"))));
    store.create_flow().await.unwrap();

    // Prepare a whole flow outside the root so it appears with a single rename
    let staging = dir.path().join("staging");
    std::fs::create_dir_all(&staging).unwrap();
    std::fs::write(staging.join(FLOW_FILE), "[flow]\nname = \"Staged\"\n").unwrap();
    std::fs::write(staging.join(SETTINGS_FILE), "[settings]\n").unwrap();
    std::fs::write(staging.join("notes.md"), "draft").unwrap();

    let poll = Duration::from_millis(100);
    let (handle, mut batches) = store.watch(poll).await.unwrap();
    let mut listing = store.subscribe();
    listing.borrow_and_update();

    std::fs::rename(&staging, store.layout().flow_dir("Staged")).unwrap();

    let first = tokio::time::timeout(Duration::from_secs(5), batches.recv())
        .await
        .expect("no change batch")
        .expect("watch ended");
    let staged: Vec<_> = first
        .iter()
        .filter(|e| e.path.to_string_lossy().contains("Staged"))
        .map(|e| e.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    for name in ["Staged", FLOW_FILE, SETTINGS_FILE, "notes.md"] {
        assert!(staged.iter().any(|n| n == name), "{} missing from {:?}", name, staged);
    }

    // The batch was preceded by exactly one refresh
    assert!(listing.has_changed().unwrap());
    let names: Vec<_> = listing.borrow_and_update().iter().map(|f| f.name.clone()).collect();
    assert_eq!(names, vec!["Flow 1".to_string(), "Staged".to_string()]);

    // Nothing about the new flow is reported again
    let mut later = Vec::new();
    while let Ok(Some(batch)) = tokio::time::timeout(poll * 4, batches.recv()).await {
        later.extend(batch);
    }
    assert!(later.iter().all(|e| !e.path.to_string_lossy().contains("Staged")));
    assert_eq!(listing.has_changed().unwrap(), !later.is_empty());

    handle.stop().await;
}
