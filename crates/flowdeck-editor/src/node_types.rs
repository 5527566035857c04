// flowdeck Editor - Node type registry
//
// Maps the node type names stored in flow.toml to a display label and the
// renderer used on the canvas. Types without an entry are still drawn, with
// the fallback renderer.

use flowdeck_viz::{FallbackNode, NodeRenderer, SuperNode};

use std::collections::HashMap;

/// Built-in node types as `(name, label)`, in palette order
pub const BUILTIN_NODE_TYPES: [(&str, &str); 10] = [
    ("vectorNode", "Vector"),
    ("pythonNode", "Python"),
    ("javascriptNode", "JavaScript"),
    ("cronNode", "Cron"),
    ("terminalNode", "Terminal"),
    ("modelNode", "Model"),
    ("manualNode", "Manual"),
    ("sendChatNode", "Send Chat"),
    ("receiveChatNode", "Receive Chat"),
    ("openAiNode", "OpenAI"),
];

/// A registered node type
pub struct NodeType {
    pub name: String,
    pub label: String,
    renderer: Box<dyn NodeRenderer>,
}

impl NodeType {
    pub fn renderer(&self) -> &dyn NodeRenderer {
        self.renderer.as_ref()
    }
}

impl std::fmt::Debug for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeType")
            .field("name", &self.name)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Debug)]
pub struct NodeTypeRegistry {
    types: HashMap<String, NodeType>,
    /// Palette order
    order: Vec<String>,
    fallback: FallbackNode,
}

impl Default for NodeTypeRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for (name, label) in BUILTIN_NODE_TYPES {
            registry.register(name, label, Box::new(SuperNode));
        }
        registry
    }
}

impl NodeTypeRegistry {
    /// Registry holding the built-in types
    pub fn new() -> Self {
        Self::default()
    }

    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
            order: Vec::new(),
            fallback: FallbackNode,
        }
    }

    /// Add or replace a node type. A replaced type keeps its palette slot.
    pub fn register(&mut self, name: &str, label: &str, renderer: Box<dyn NodeRenderer>) {
        let previous = self.types.insert(
            name.to_string(),
            NodeType {
                name: name.to_string(),
                label: label.to_string(),
                renderer,
            },
        );
        if previous.is_none() {
            self.order.push(name.to_string());
        }
        tracing::debug!("Registered node type: {}", name);
    }

    pub fn get(&self, name: &str) -> Option<&NodeType> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Label for a node type; unknown types are labelled with their name
    pub fn label<'a>(&'a self, name: &'a str) -> &'a str {
        self.get(name).map(|t| t.label.as_str()).unwrap_or(name)
    }

    /// Renderer for a node type, falling back for unknown or missing types
    pub fn renderer_for(&self, node_type: Option<&str>) -> &dyn NodeRenderer {
        match node_type.and_then(|name| self.get(name)) {
            Some(t) => t.renderer(),
            None => &self.fallback,
        }
    }

    /// Registered types in palette order
    pub fn palette(&self) -> Vec<&NodeType> {
        self.order.iter().filter_map(|n| self.types.get(n)).collect()
    }

    pub fn count(&self) -> usize {
        self.types.len()
    }
}
