//! Node rendering: the shared base shell and the renderers built on it

use crate::RenderConfig;
use flowdeck_core::GraphNode;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Narrowest content area a node gets
const MIN_INNER_WIDTH: usize = 8;

/// Renders one node as text lines of equal display width
pub trait NodeRenderer: Send + Sync {
    fn render(&self, node: &GraphNode, selected: bool, config: &RenderConfig) -> Vec<String>;
}

struct BorderSet {
    top_left: &'static str,
    top_right: &'static str,
    bottom_left: &'static str,
    bottom_right: &'static str,
    horizontal: &'static str,
    vertical: &'static str,
    ellipsis: &'static str,
}

impl BorderSet {
    fn pick(config: &RenderConfig, selected: bool) -> Self {
        match (config.use_unicode, selected) {
            (true, false) => Self {
                top_left: "╭",
                top_right: "╮",
                bottom_left: "╰",
                bottom_right: "╯",
                horizontal: "─",
                vertical: "│",
                ellipsis: "…",
            },
            (true, true) => Self {
                top_left: "┏",
                top_right: "┓",
                bottom_left: "┗",
                bottom_right: "┛",
                horizontal: "━",
                vertical: "┃",
                ellipsis: "…",
            },
            (false, false) => Self {
                top_left: "+",
                top_right: "+",
                bottom_left: "+",
                bottom_right: "+",
                horizontal: "-",
                vertical: "|",
                ellipsis: "~",
            },
            (false, true) => Self {
                top_left: "#",
                top_right: "#",
                bottom_left: "#",
                bottom_right: "#",
                horizontal: "=",
                vertical: "#",
                ellipsis: "~",
            },
        }
    }
}

/// Cut `text` to at most `width` display columns
fn truncate(text: &str, width: usize, ellipsis: &str) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let budget = width.saturating_sub(ellipsis.width());
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push_str(ellipsis);
    out
}

fn pad(text: &str, width: usize) -> String {
    let mut out = text.to_string();
    out.push_str(&" ".repeat(width.saturating_sub(text.width())));
    out
}

/// The shell every node is drawn in: a box with the node id in its top border
pub struct BaseNode;

impl BaseNode {
    pub fn render(id: &str, content: &[String], selected: bool, config: &RenderConfig) -> Vec<String> {
        let borders = BorderSet::pick(config, selected);
        let max_inner = config.max_width.saturating_sub(4).max(MIN_INNER_WIDTH);

        let wanted = content
            .iter()
            .map(|l| l.width())
            .chain(std::iter::once(id.width() + 2))
            .max()
            .unwrap_or(0);
        let inner = wanted.clamp(MIN_INNER_WIDTH, max_inner);
        let total = inner + 4;

        let label = truncate(id, inner - 2, borders.ellipsis);
        let mut lines = Vec::with_capacity(content.len() + 4);
        lines.push(format!(
            "{}{} {} {}{}",
            borders.top_left,
            borders.horizontal,
            label,
            borders.horizontal.repeat(total - 5 - label.width()),
            borders.top_right
        ));

        let blank = format!("{} {} {}", borders.vertical, " ".repeat(inner), borders.vertical);
        if !config.compact {
            lines.push(blank.clone());
        }
        for line in content {
            lines.push(format!(
                "{} {} {}",
                borders.vertical,
                pad(&truncate(line, inner, borders.ellipsis), inner),
                borders.vertical
            ));
        }
        if !config.compact {
            lines.push(blank);
        }

        lines.push(format!(
            "{}{}{}",
            borders.bottom_left,
            borders.horizontal.repeat(total - 2),
            borders.bottom_right
        ));
        lines
    }
}

/// A node showing its `data.title` (or its id when untitled)
#[derive(Debug, Default, Clone, Copy)]
pub struct SuperNode;

impl NodeRenderer for SuperNode {
    fn render(&self, node: &GraphNode, selected: bool, config: &RenderConfig) -> Vec<String> {
        let title = node.title().unwrap_or(&node.id).to_string();
        BaseNode::render(&node.id, &[title], selected, config)
    }
}

/// Used for node types nothing is registered for; shows the type name too
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackNode;

impl NodeRenderer for FallbackNode {
    fn render(&self, node: &GraphNode, selected: bool, config: &RenderConfig) -> Vec<String> {
        let title = node.title().unwrap_or(&node.id).to_string();
        let kind = format!("<{}>", node.node_type.as_deref().unwrap_or("untyped"));
        BaseNode::render(&node.id, &[title, kind], selected, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowdeck_core::Position;
    use pretty_assertions::assert_eq;

    fn titled(id: &str, title: &str) -> GraphNode {
        let mut node = GraphNode::new(id, "cronNode", Position::default());
        let mut data = toml::Table::new();
        data.insert("title".into(), toml::Value::String(title.into()));
        node.data = toml::Value::Table(data);
        node
    }

    #[test]
    fn test_super_node_renders_title() {
        let lines = SuperNode.render(&titled("a", "Cron"), false, &RenderConfig::default());
        assert_eq!(
            lines,
            vec![
                "╭─ a ──────╮".to_string(),
                "│ Cron     │".to_string(),
                "╰──────────╯".to_string(),
            ]
        );
    }

    #[test]
    fn test_super_node_falls_back_to_id() {
        let node = GraphNode::new("node-7", "cronNode", Position::default());
        let lines = SuperNode.render(&node, false, &RenderConfig::ascii());
        assert_eq!(lines[1], "| node-7   |");
        assert!(lines[0].starts_with("+- node-7"));
    }

    #[test]
    fn test_selected_node_uses_heavy_border() {
        let lines = SuperNode.render(&titled("a", "Cron"), true, &RenderConfig::default());
        assert!(lines[0].starts_with('┏'));
        assert!(lines[2].ends_with('┛'));
    }

    #[test]
    fn test_long_titles_are_truncated() {
        let config = RenderConfig::default();
        let lines = SuperNode.render(
            &titled("a", "A very long title that does not fit in the node"),
            false,
            &config,
        );
        for line in &lines {
            assert_eq!(line.width(), config.max_width);
        }
        assert!(lines[1].contains('…'));
    }

    #[test]
    fn test_non_compact_adds_padding_rows() {
        let lines = SuperNode.render(&titled("a", "Cron"), false, &RenderConfig::terminal());
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_fallback_shows_type() {
        let mut node = titled("x", "Thing");
        node.node_type = Some("mysteryNode".into());
        let lines = FallbackNode.render(&node, false, &RenderConfig::default());
        assert!(lines.iter().any(|l| l.contains("<mysteryNode>")));
    }
}
