//! The editor route: one flow's canvas plus its side panels
//!
//! [`FlowEditor`] only composes: the graph, the open panels, the node type
//! registry and the canvas anchor. Drawing is left to the front-end, which
//! asks [`FlowEditor::layout`] where each part goes.

use crate::graph::{AnchorRect, Connection, DragPayload, DropEffect, EdgeChange, FlowGraph, NodeChange};
use crate::navigation::{Navigation, Panel};
use crate::node_types::NodeTypeRegistry;

use flowdeck_core::{FlowGraphDocument, FlowdeckResult, Position, SettingsDocument};
use flowdeck_store::FlowStore;
use flowdeck_viz::{CanvasItem, CanvasRenderer};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Rows taken by the header
pub const HEADER_HEIGHT: u16 = 1;
/// The canvas never gets narrower than this while panels are open
pub const MIN_CANVAS_WIDTH: u16 = 20;

const DEBUG_LOG_CAPACITY: usize = 500;

/// A rectangle in terminal cells
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Area {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Area {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }
}

/// Where each part of the editor is drawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorLayout {
    pub header: Area,
    pub canvas: Area,
    /// Open panels, left to right
    pub panels: Vec<(Panel, Area)>,
}

impl EditorLayout {
    pub fn panel(&self, panel: Panel) -> Option<Area> {
        self.panels.iter().find(|(p, _)| *p == panel).map(|(_, a)| *a)
    }
}

/// Log lines shown in the debug panel. Belongs to one flow.
#[derive(Debug, Clone)]
pub struct DebugLog {
    flow_name: String,
    lines: VecDeque<String>,
    capacity: usize,
}

impl DebugLog {
    pub fn new(flow_name: impl Into<String>) -> Self {
        Self {
            flow_name: flow_name.into(),
            lines: VecDeque::new(),
            capacity: DEBUG_LOG_CAPACITY,
        }
    }

    pub fn flow_name(&self) -> &str {
        &self.flow_name
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

pub struct FlowEditor {
    flow_name: String,
    pub graph: FlowGraph,
    pub navigation: Navigation,
    registry: NodeTypeRegistry,
    anchor: AnchorRect,
    debug_log: DebugLog,
    settings: Option<SettingsDocument>,
    source: Option<String>,
}

impl FlowEditor {
    pub fn new(flow_name: impl Into<String>, graph: FlowGraph) -> Self {
        let flow_name = flow_name.into();
        Self {
            debug_log: DebugLog::new(flow_name.clone()),
            flow_name,
            graph,
            navigation: Navigation::default(),
            registry: NodeTypeRegistry::new(),
            anchor: AnchorRect::default(),
            settings: None,
            source: None,
        }
    }

    /// Load a flow's graph, settings and raw text from the store
    pub async fn open(store: &FlowStore, flow_name: &str) -> FlowdeckResult<Self> {
        let mut editor = Self::new(flow_name, FlowGraph::new());
        editor.reload(store).await?;
        Ok(editor)
    }

    /// Re-read everything for the current flow, discarding unsaved changes
    pub async fn reload(&mut self, store: &FlowStore) -> FlowdeckResult<()> {
        let document = store.load_graph(&self.flow_name).await?;
        self.install(store, document).await;
        Ok(())
    }

    async fn install(&mut self, store: &FlowStore, document: FlowGraphDocument) {
        let viewport = self.graph.viewport;
        self.graph = FlowGraph::from_document(document);
        self.graph.viewport = viewport;
        self.refresh_panels(store).await;
        info!("Opened flow {} ({} nodes)", self.flow_name, self.graph.nodes().len());
    }

    /// Re-read settings and raw text. Failures leave the panel empty.
    pub async fn refresh_panels(&mut self, store: &FlowStore) {
        self.settings = match store.read_settings(&self.flow_name).await {
            Ok(settings) => Some(settings),
            Err(e) => {
                self.debug_log.push(format!("settings: {}", e));
                None
            }
        };
        self.source = match store.read_flow_source(&self.flow_name).await {
            Ok(text) => Some(text),
            Err(e) => {
                self.debug_log.push(format!("flow.toml: {}", e));
                None
            }
        };
    }

    /// Write the graph back into flow.toml
    pub async fn save(&mut self, store: &FlowStore) -> FlowdeckResult<()> {
        store.save_graph(&self.flow_name, &self.graph.to_document()).await?;
        self.graph.mark_saved();
        self.source = store.read_flow_source(&self.flow_name).await.ok();
        self.debug_log.push(format!("saved {}", self.flow_name));
        Ok(())
    }

    /// Edit another flow. The debug log only survives if the name is unchanged.
    ///
    /// If the new flow cannot be loaded the editor stays on the current one.
    pub async fn switch_flow(&mut self, store: &FlowStore, flow_name: &str) -> FlowdeckResult<()> {
        let document = store.load_graph(flow_name).await?;
        if flow_name != self.flow_name {
            debug!("Switching editor from {} to {}", self.flow_name, flow_name);
            self.flow_name = flow_name.to_string();
            self.debug_log = DebugLog::new(flow_name);
        }
        self.install(store, document).await;
        Ok(())
    }

    pub fn flow_name(&self) -> &str {
        &self.flow_name
    }

    pub fn registry(&self) -> &NodeTypeRegistry {
        &self.registry
    }

    pub fn debug_log(&self) -> &DebugLog {
        &self.debug_log
    }

    pub fn log(&mut self, line: impl Into<String>) {
        self.debug_log.push(line);
    }

    pub fn settings(&self) -> Option<&SettingsDocument> {
        self.settings.as_ref()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn anchor(&self) -> AnchorRect {
        self.anchor
    }

    pub fn set_anchor(&mut self, anchor: AnchorRect) {
        self.anchor = anchor;
    }

    /// Split `area` into header, canvas and the open panels.
    ///
    /// Panels take their fraction of the full width. When that would leave
    /// the canvas under [`MIN_CANVAS_WIDTH`], all panels shrink by the same
    /// ratio.
    pub fn layout(&self, area: Area) -> EditorLayout {
        let header_height = HEADER_HEIGHT.min(area.height);
        let header = Area::new(area.x, area.y, area.width, header_height);
        let body_y = area.y + header_height;
        let body_height = area.height - header_height;

        let open = self.navigation.open_panels();
        let mut widths: Vec<u32> = open
            .iter()
            .map(|p| {
                let (num, den) = p.width_fraction();
                area.width as u32 * num as u32 / den as u32
            })
            .collect();

        let total: u32 = widths.iter().sum();
        let available = area.width.saturating_sub(MIN_CANVAS_WIDTH) as u32;
        if total > available {
            for w in &mut widths {
                *w = *w * available / total;
            }
        }

        let panels_width: u32 = widths.iter().sum();
        let canvas_width = area.width - panels_width as u16;
        let canvas = Area::new(area.x, body_y, canvas_width, body_height);

        let mut x = area.x + canvas_width;
        let panels = open
            .into_iter()
            .zip(widths)
            .map(|(panel, w)| {
                let slot = Area::new(x, body_y, w as u16, body_height);
                x += w as u16;
                (panel, slot)
            })
            .collect();

        EditorLayout {
            header,
            canvas,
            panels,
        }
    }

    // Canvas callbacks

    pub fn on_nodes_change(&mut self, changes: Vec<NodeChange>) -> usize {
        self.graph.on_nodes_change(changes)
    }

    pub fn on_edges_change(&mut self, changes: Vec<EdgeChange>) -> usize {
        self.graph.on_edges_change(changes)
    }

    pub fn on_connect(&mut self, connection: Connection) -> FlowdeckResult<String> {
        let result = self.graph.on_connect(connection);
        if let Err(e) = &result {
            self.debug_log.push(format!("connect: {}", e));
        }
        result
    }

    pub fn on_drag_over(&self, payload: &DragPayload) -> DropEffect {
        self.graph.on_drag_over(payload, &self.registry)
    }

    pub fn on_drop(&mut self, payload: &DragPayload, screen_point: Position) -> FlowdeckResult<String> {
        let result = self.graph.on_drop(payload, screen_point, self.anchor, &self.registry);
        match &result {
            Ok(id) => self.debug_log.push(format!("added {} {}", payload.node_type, id)),
            Err(e) => self.debug_log.push(format!("drop: {}", e)),
        }
        result
    }

    /// Canvas text for a `width` x `height` area
    pub fn render_canvas(&self, renderer: &CanvasRenderer, width: usize, height: usize) -> Vec<String> {
        let items: Vec<CanvasItem<'_>> = self
            .graph
            .nodes()
            .iter()
            .map(|n| CanvasItem {
                node: &n.node,
                selected: n.selected,
                renderer: self.registry.renderer_for(n.node.node_type.as_deref()),
            })
            .collect();
        let edges: Vec<_> = self.graph.edges().iter().map(|e| e.edge.clone()).collect();
        renderer.render(&items, &edges, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn editor() -> FlowEditor {
        FlowEditor::new("Flow 1", FlowGraph::new())
    }

    #[test]
    fn test_layout_node_panel_only() {
        let editor = editor();
        let layout = editor.layout(Area::new(0, 0, 100, 30));
        assert_eq!(layout.header, Area::new(0, 0, 100, 1));
        assert_eq!(layout.canvas, Area::new(0, 1, 75, 29));
        assert_eq!(layout.panels, vec![(Panel::Node, Area::new(75, 1, 25, 29))]);
    }

    #[test]
    fn test_layout_no_panels() {
        let mut editor = editor();
        editor.navigation.set(Panel::Node, false);
        let layout = editor.layout(Area::new(0, 0, 80, 24));
        assert_eq!(layout.canvas.width, 80);
        assert!(layout.panels.is_empty());
    }

    #[test]
    fn test_layout_debug_and_toml() {
        let mut editor = editor();
        editor.navigation = Navigation {
            node_panel: false,
            debug_panel: true,
            settings_panel: false,
            toml_panel: true,
        };
        let layout = editor.layout(Area::new(0, 0, 200, 40));
        assert_eq!(layout.canvas.width, 50);
        assert_eq!(layout.panel(Panel::Debug), Some(Area::new(50, 1, 50, 39)));
        assert_eq!(layout.panel(Panel::Toml), Some(Area::new(100, 1, 100, 39)));
    }

    #[test]
    fn test_layout_all_panels_shrink_to_keep_canvas() {
        let mut editor = editor();
        editor.navigation = Navigation {
            node_panel: true,
            debug_panel: true,
            settings_panel: true,
            toml_panel: true,
        };
        let layout = editor.layout(Area::new(0, 0, 100, 30));
        assert_eq!(layout.canvas.width, MIN_CANVAS_WIDTH);
        let widths: Vec<u16> = layout.panels.iter().map(|(_, a)| a.width).collect();
        assert_eq!(widths, vec![16, 16, 16, 32]);
        let last = layout.panels.last().unwrap().1;
        assert_eq!(last.x + last.width, 100);
    }

    #[test]
    fn test_debug_log_is_bounded() {
        let mut log = DebugLog::new("Flow 1");
        for i in 0..(DEBUG_LOG_CAPACITY + 10) {
            log.push(format!("line {}", i));
        }
        assert_eq!(log.len(), DEBUG_LOG_CAPACITY);
        assert_eq!(log.lines().next(), Some("line 10"));
    }

    #[test]
    fn test_drop_uses_anchor() {
        let mut editor = editor();
        editor.set_anchor(AnchorRect::from_cells(0, 1, 40, 20));
        assert_eq!(editor.on_drag_over(&DragPayload::new("cronNode")), DropEffect::Move);

        let id = editor
            .on_drop(&DragPayload::new("cronNode"), Position::new(80.0, 16.0 + 32.0))
            .unwrap();
        assert_eq!(editor.graph.node(&id).unwrap().position, Position::new(80.0, 32.0));
        assert!(editor.debug_log().lines().any(|l| l.contains(&id)));
    }

    #[test]
    fn test_render_canvas_draws_nodes() {
        let mut editor = editor();
        editor.set_anchor(AnchorRect::from_cells(0, 0, 40, 10));
        editor
            .on_drop(&DragPayload::new("cronNode"), Position::new(8.0, 16.0))
            .unwrap();
        let lines = editor.render_canvas(&CanvasRenderer::default(), 40, 10);
        assert_eq!(lines.len(), 10);
        assert!(lines[2].contains("Cron"));
    }
}
