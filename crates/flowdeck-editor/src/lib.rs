//! flowdeck Editor - State behind the flow editing screen
//!
//! - [`FlowGraph`]: nodes, edges and selection for one flow, updated through
//!   canvas callbacks (node/edge changes, connect, drag-over, drop)
//! - [`Navigation`]: which side panels are open
//! - [`NodeTypeRegistry`]: node type names mapped to labels and renderers
//! - [`FlowEditor`]: composes the above, loads and saves through a
//!   [`flowdeck_store::FlowStore`], and lays the screen out

pub mod graph;
pub mod navigation;
pub mod node_types;
pub mod route;

pub use graph::{
    AnchorRect, Connection, DragPayload, DropEffect, EdgeChange, EditorEdge, EditorNode, FlowGraph,
    NodeChange,
};
pub use navigation::{Navigation, Panel};
pub use node_types::{NodeType, NodeTypeRegistry, BUILTIN_NODE_TYPES};
pub use route::{Area, DebugLog, EditorLayout, FlowEditor, HEADER_HEIGHT, MIN_CANVAS_WIDTH};
