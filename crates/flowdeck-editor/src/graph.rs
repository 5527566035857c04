//! In-memory flow graph edited on the canvas
//!
//! [`FlowGraph`] holds the nodes and edges of one flow together with their
//! selection state and the canvas viewport. Canvas interactions arrive as
//! change lists and are applied here; the result converts back into a
//! [`FlowGraphDocument`] for saving.

use crate::node_types::NodeTypeRegistry;

use flowdeck_core::{
    edge_id, FlowGraphDocument, FlowdeckError, FlowdeckResult, GraphEdge, GraphNode, Position,
};
use flowdeck_viz::{Viewport, CELL_HEIGHT, CELL_WIDTH};
use toml::{Table, Value};
use tracing::{debug, warn};

/// A node plus its selection flag
#[derive(Debug, Clone, PartialEq)]
pub struct EditorNode {
    pub node: GraphNode,
    pub selected: bool,
}

/// An edge plus its selection flag
#[derive(Debug, Clone, PartialEq)]
pub struct EditorEdge {
    pub edge: GraphEdge,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeChange {
    Position { id: String, position: Position },
    Remove { id: String },
    Select { id: String, selected: bool },
    Add { node: GraphNode },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EdgeChange {
    Remove { id: String },
    Select { id: String, selected: bool },
}

/// A request to connect two nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub source: String,
    pub target: String,
}

impl Connection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// What is being dragged onto the canvas: a node type from the palette
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragPayload {
    pub node_type: String,
}

impl DragPayload {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropEffect {
    Move,
    None,
}

/// Canvas bounds in screen units, used to make drop points canvas-relative
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnchorRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl AnchorRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Bounds of a terminal area given in cells
    pub fn from_cells(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x: x as f64 * CELL_WIDTH,
            y: y as f64 * CELL_HEIGHT,
            width: width as f64 * CELL_WIDTH,
            height: height as f64 * CELL_HEIGHT,
        }
    }

    pub fn contains(&self, point: Position) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x < self.x + self.width
            && point.y < self.y + self.height
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    nodes: Vec<EditorNode>,
    edges: Vec<EditorEdge>,
    pub viewport: Viewport,
    dirty: bool,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(document: FlowGraphDocument) -> Self {
        Self {
            nodes: document
                .nodes
                .into_iter()
                .map(|node| EditorNode { node, selected: false })
                .collect(),
            edges: document
                .edges
                .into_iter()
                .map(|edge| EditorEdge { edge, selected: false })
                .collect(),
            viewport: Viewport::default(),
            dirty: false,
        }
    }

    pub fn to_document(&self) -> FlowGraphDocument {
        FlowGraphDocument {
            nodes: self.nodes.iter().map(|n| n.node.clone()).collect(),
            edges: self.edges.iter().map(|e| e.edge.clone()).collect(),
        }
    }

    pub fn nodes(&self) -> &[EditorNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EditorEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.node.id == id).map(|n| &n.node)
    }

    /// Whether the graph changed since it was loaded or last marked saved
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub fn selected_nodes(&self) -> Vec<&GraphNode> {
        self.nodes.iter().filter(|n| n.selected).map(|n| &n.node).collect()
    }

    /// Apply node changes in order. Returns how many took effect.
    pub fn on_nodes_change(&mut self, changes: Vec<NodeChange>) -> usize {
        let mut applied = 0;
        for change in changes {
            let done = match change {
                NodeChange::Position { id, position } => match self.node_mut(&id) {
                    Some(entry) => {
                        entry.node.position = position;
                        self.dirty = true;
                        true
                    }
                    None => false,
                },
                NodeChange::Remove { id } => self.remove_node(&id),
                NodeChange::Select { id, selected } => match self.node_mut(&id) {
                    Some(entry) => {
                        entry.selected = selected;
                        true
                    }
                    None => false,
                },
                NodeChange::Add { node } => {
                    if self.node(&node.id).is_some() {
                        warn!("Ignoring add of existing node {}", node.id);
                        false
                    } else {
                        self.nodes.push(EditorNode { node, selected: false });
                        self.dirty = true;
                        true
                    }
                }
            };
            if done {
                applied += 1;
            }
        }
        applied
    }

    /// Apply edge changes in order. Returns how many took effect.
    pub fn on_edges_change(&mut self, changes: Vec<EdgeChange>) -> usize {
        let mut applied = 0;
        for change in changes {
            match change {
                EdgeChange::Remove { id } => {
                    let before = self.edges.len();
                    self.edges.retain(|e| e.edge.id != id);
                    if self.edges.len() != before {
                        self.dirty = true;
                        applied += 1;
                    }
                }
                EdgeChange::Select { id, selected } => {
                    if let Some(entry) = self.edges.iter_mut().find(|e| e.edge.id == id) {
                        entry.selected = selected;
                        applied += 1;
                    }
                }
            }
        }
        applied
    }

    /// Add the edge `source -> target`, returning its id
    pub fn on_connect(&mut self, connection: Connection) -> FlowdeckResult<String> {
        let Connection { source, target } = connection;
        if source == target {
            return Err(FlowdeckError::invalid_input(format!(
                "cannot connect node {} to itself",
                source
            )));
        }
        for endpoint in [&source, &target] {
            if self.node(endpoint).is_none() {
                return Err(FlowdeckError::invalid_input(format!("unknown node {}", endpoint)));
            }
        }

        if self
            .edges
            .iter()
            .any(|e| e.edge.source == source && e.edge.target == target)
        {
            return Err(FlowdeckError::already_exists(format!(
                "edge {} -> {}",
                source, target
            )));
        }

        // `a-b -> c` and `a -> b-c` derive the same id; number the later one
        let base = edge_id(&source, &target);
        let mut id = base.clone();
        let mut n = 2;
        while self.edges.iter().any(|e| e.edge.id == id) {
            id = format!("{}-{}", base, n);
            n += 1;
        }

        debug!("Connected {} -> {} as {}", source, target, id);
        let mut edge = GraphEdge::new(source, target);
        edge.id = id.clone();
        self.edges.push(EditorEdge { edge, selected: false });
        self.dirty = true;
        Ok(id)
    }

    pub fn on_drag_over(&self, payload: &DragPayload, registry: &NodeTypeRegistry) -> DropEffect {
        if registry.contains(&payload.node_type) {
            DropEffect::Move
        } else {
            DropEffect::None
        }
    }

    /// Create a node of the dragged type where it was dropped. `screen_point`
    /// is in the same screen units as `anchor`. Returns the new node id.
    pub fn on_drop(
        &mut self,
        payload: &DragPayload,
        screen_point: Position,
        anchor: AnchorRect,
        registry: &NodeTypeRegistry,
    ) -> FlowdeckResult<String> {
        let node_type = registry.get(&payload.node_type).ok_or_else(|| {
            FlowdeckError::invalid_input(format!("unknown node type {}", payload.node_type))
        })?;
        if !anchor.contains(screen_point) {
            return Err(FlowdeckError::invalid_input("drop point is outside the canvas"));
        }

        let relative = Position::new(screen_point.x - anchor.x, screen_point.y - anchor.y);
        let position = self.viewport.unproject(relative);

        let mut node = GraphNode::new(uuid::Uuid::new_v4().to_string(), &node_type.name, position);
        let mut data = Table::new();
        data.insert("title".to_string(), Value::String(node_type.label.clone()));
        node.data = Value::Table(data);

        let id = node.id.clone();
        debug!("Dropped {} node {} at ({}, {})", node_type.name, id, position.x, position.y);
        self.nodes.push(EditorNode { node, selected: false });
        self.dirty = true;
        Ok(id)
    }

    /// Select exactly one node (or none), clearing the rest
    pub fn select_only(&mut self, id: Option<&str>) {
        for entry in &mut self.nodes {
            entry.selected = Some(entry.node.id.as_str()) == id;
        }
    }

    /// Move the selection to the next node in order, wrapping around
    pub fn select_next(&mut self) -> Option<String> {
        if self.nodes.is_empty() {
            return None;
        }
        let next = match self.nodes.iter().position(|n| n.selected) {
            Some(i) => (i + 1) % self.nodes.len(),
            None => 0,
        };
        let id = self.nodes[next].node.id.clone();
        self.select_only(Some(&id));
        Some(id)
    }

    fn node_mut(&mut self, id: &str) -> Option<&mut EditorNode> {
        self.nodes.iter_mut().find(|n| n.node.id == id)
    }

    fn remove_node(&mut self, id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.node.id != id);
        if self.nodes.len() == before {
            return false;
        }
        self.edges.retain(|e| e.edge.source != id && e.edge.target != id);
        self.dirty = true;
        true
    }
}
