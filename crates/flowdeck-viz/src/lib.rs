//! flowdeck Visualization - text rendering for the flow editor
//!
//! This crate renders:
//! - Nodes inside the shared base shell (titled "super" nodes and fallbacks)
//! - A character-grid canvas placing nodes by their flow position
//! - The flow listing
//!
//! Output is plain `String` lines so it can be drawn by any terminal
//! front-end or printed directly.

mod canvas;
mod list;
mod node;

pub use canvas::{CanvasItem, CanvasRenderer, Viewport, CELL_HEIGHT, CELL_WIDTH};
pub use list::FlowListRenderer;
pub use node::{BaseNode, FallbackNode, NodeRenderer, SuperNode};

/// Render configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Maximum width of a rendered node, borders included
    pub max_width: usize,
    /// Use Unicode box drawing characters
    pub use_unicode: bool,
    /// Compact mode (no padding line inside nodes)
    pub compact: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_width: 28,
            use_unicode: true,
            compact: true,
        }
    }
}

impl RenderConfig {
    /// Configuration for terminal UIs
    pub fn terminal() -> Self {
        Self {
            max_width: 32,
            use_unicode: true,
            compact: false,
        }
    }

    /// Pure ASCII output for logs and dumb terminals
    pub fn ascii() -> Self {
        Self {
            max_width: 28,
            use_unicode: false,
            compact: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_config_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.max_width, 28);
        assert!(config.use_unicode);
        assert!(config.compact);
    }

    #[test]
    fn test_render_config_ascii() {
        let config = RenderConfig::ascii();
        assert!(!config.use_unicode);
    }
}
