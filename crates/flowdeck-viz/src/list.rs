//! Flow listing rendering

use crate::RenderConfig;
use flowdeck_core::{FlowEntry, FLOW_FILE, SETTINGS_FILE};

/// Renders the enumerated flows as a sidebar-style list
pub struct FlowListRenderer {
    config: RenderConfig,
}

impl FlowListRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// One line per flow. Flows missing a document are marked incomplete.
    pub fn render(&self, flows: &[FlowEntry], selected: Option<usize>) -> String {
        if flows.is_empty() {
            return "No flows".to_string();
        }

        let mut lines = Vec::with_capacity(flows.len());
        for (i, flow) in flows.iter().enumerate() {
            let complete = flow.has_child(FLOW_FILE) && flow.has_child(SETTINGS_FILE);
            let cursor = match (selected == Some(i), self.config.use_unicode) {
                (true, true) => "▸ ",
                (true, false) => "> ",
                (false, _) => "  ",
            };
            let marker = match (complete, self.config.use_unicode) {
                (true, true) => "●",
                (false, true) => "◌",
                (true, false) => "[x]",
                (false, false) => "[ ]",
            };

            let mut line = format!("{}{} {}", cursor, marker, flow.name);
            if !complete {
                line.push_str(" (incomplete)");
            }
            lines.push(line);
        }
        lines.join("\n")
    }
}
