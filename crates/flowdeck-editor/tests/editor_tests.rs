//! Flow Editor Integration Tests
//!
//! Drives a `FlowEditor` against a real store in a temporary directory.

use flowdeck_core::{FlowLayout, Position};
use flowdeck_editor::{
    AnchorRect, Connection, DragPayload, FlowEditor, NodeChange, Panel,
};
use flowdeck_store::FlowStore;
use tempfile::{tempdir, TempDir};

async fn store_with_flow() -> (FlowStore, String, TempDir) {
    let dir = tempdir().unwrap();
    let store = FlowStore::new(FlowLayout::new(dir.path()));
    let meta = store.create_flow().await.unwrap();
    (store, meta.name, dir)
}

// ============================================================================
// Load / save
// ============================================================================

#[tokio::test]
async fn test_open_new_flow_is_empty() {
    let (store, name, _dir) = store_with_flow().await;
    let editor = FlowEditor::open(&store, &name).await.unwrap();

    assert_eq!(editor.flow_name(), name);
    assert!(editor.graph.nodes().is_empty());
    assert!(editor.settings().is_some());
    assert!(editor.source().unwrap().contains("[flow]"));
}

#[tokio::test]
async fn test_open_missing_flow_fails() {
    let (store, _name, _dir) = store_with_flow().await;
    let err = FlowEditor::open(&store, "Nope").await.err().unwrap();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_drop_connect_save_reload() {
    let (store, name, _dir) = store_with_flow().await;
    let mut editor = FlowEditor::open(&store, &name).await.unwrap();
    editor.set_anchor(AnchorRect::new(0.0, 0.0, 800.0, 600.0));

    let a = editor
        .on_drop(&DragPayload::new("cronNode"), Position::new(10.0, 20.0))
        .unwrap();
    let b = editor
        .on_drop(&DragPayload::new("openAiNode"), Position::new(300.0, 20.0))
        .unwrap();
    editor.on_connect(Connection::new(&a, &b)).unwrap();
    assert!(editor.graph.is_dirty());

    editor.save(&store).await.unwrap();
    assert!(!editor.graph.is_dirty());
    assert!(editor.source().unwrap().contains("[[nodes]]"));

    let reopened = FlowEditor::open(&store, &name).await.unwrap();
    assert_eq!(reopened.graph.to_document(), editor.graph.to_document());
    assert_eq!(reopened.graph.node(&b).unwrap().title(), Some("OpenAI"));

    // Metadata survives saving the graph
    let meta = store.read_metadata(&name).await.unwrap();
    assert_eq!(meta.name, name);

    // Node configuration is reachable through the store by the dropped id
    let node = store.read_node_config(&name, &a).await.unwrap();
    assert_eq!(node["type"].as_str(), Some("cronNode"));
}

#[tokio::test]
async fn test_removing_node_and_saving_drops_edges() {
    let (store, name, _dir) = store_with_flow().await;
    let mut editor = FlowEditor::open(&store, &name).await.unwrap();
    editor.set_anchor(AnchorRect::new(0.0, 0.0, 800.0, 600.0));

    let a = editor
        .on_drop(&DragPayload::new("pythonNode"), Position::new(0.0, 0.0))
        .unwrap();
    let b = editor
        .on_drop(&DragPayload::new("terminalNode"), Position::new(100.0, 0.0))
        .unwrap();
    editor.on_connect(Connection::new(&a, &b)).unwrap();
    editor.on_nodes_change(vec![NodeChange::Remove { id: a.clone() }]);
    editor.save(&store).await.unwrap();

    let graph = store.load_graph(&name).await.unwrap();
    assert_eq!(graph.nodes.len(), 1);
    assert!(graph.edges.is_empty());
}

// ============================================================================
// Flow switching
// ============================================================================

#[tokio::test]
async fn test_switching_flow_resets_debug_log() {
    let (store, first, _dir) = store_with_flow().await;
    let second = store.create_flow().await.unwrap().name;

    let mut editor = FlowEditor::open(&store, &first).await.unwrap();
    editor.navigation.toggle(Panel::Debug);
    editor.log("hello");
    assert_eq!(editor.debug_log().len(), 1);

    editor.switch_flow(&store, &first).await.unwrap();
    assert_eq!(editor.debug_log().len(), 1);

    editor.switch_flow(&store, &second).await.unwrap();
    assert_eq!(editor.flow_name(), second);
    assert_eq!(editor.debug_log().flow_name(), second);
    assert!(editor.debug_log().is_empty());
    assert!(editor.navigation.debug_panel);
}

#[tokio::test]
async fn test_failed_switch_keeps_current_flow() {
    let (store, first, _dir) = store_with_flow().await;
    let mut editor = FlowEditor::open(&store, &first).await.unwrap();
    editor.set_anchor(AnchorRect::new(0.0, 0.0, 800.0, 600.0));
    let id = editor
        .on_drop(&DragPayload::new("cronNode"), Position::new(10.0, 20.0))
        .unwrap();
    editor.log("hello");

    let err = editor.switch_flow(&store, "Nope").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(editor.flow_name(), first);
    assert_eq!(editor.debug_log().len(), 1);
    assert!(editor.graph.node(&id).is_some());

    // Saving still targets the flow the graph came from
    editor.save(&store).await.unwrap();
    assert_eq!(store.load_graph(&first).await.unwrap().nodes.len(), 1);
}
