//! Panel visibility

/// Side panels the editor can show next to the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    /// Palette of node types to drop onto the canvas
    Node,
    /// Log lines for the flow being edited
    Debug,
    /// settings.toml of the flow
    Settings,
    /// Raw flow.toml text
    Toml,
}

impl Panel {
    /// Layout order, left to right after the canvas
    pub const ALL: [Panel; 4] = [Panel::Node, Panel::Debug, Panel::Settings, Panel::Toml];

    /// Share of the editor width as `(numerator, denominator)`
    pub fn width_fraction(&self) -> (u16, u16) {
        match self {
            Panel::Toml => (1, 2),
            _ => (1, 4),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Panel::Node => "Nodes",
            Panel::Debug => "Debug",
            Panel::Settings => "Settings",
            Panel::Toml => "flow.toml",
        }
    }
}

/// Which panels are open. Any combination is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    pub node_panel: bool,
    pub debug_panel: bool,
    pub settings_panel: bool,
    pub toml_panel: bool,
}

impl Default for Navigation {
    fn default() -> Self {
        Self {
            node_panel: true,
            debug_panel: false,
            settings_panel: false,
            toml_panel: false,
        }
    }
}

impl Navigation {
    pub fn is_open(&self, panel: Panel) -> bool {
        match panel {
            Panel::Node => self.node_panel,
            Panel::Debug => self.debug_panel,
            Panel::Settings => self.settings_panel,
            Panel::Toml => self.toml_panel,
        }
    }

    pub fn set(&mut self, panel: Panel, open: bool) {
        let flag = match panel {
            Panel::Node => &mut self.node_panel,
            Panel::Debug => &mut self.debug_panel,
            Panel::Settings => &mut self.settings_panel,
            Panel::Toml => &mut self.toml_panel,
        };
        *flag = open;
    }

    /// Flip a panel, returning its new state
    pub fn toggle(&mut self, panel: Panel) -> bool {
        let open = !self.is_open(panel);
        self.set(panel, open);
        open
    }

    /// Open panels in layout order
    pub fn open_panels(&self) -> Vec<Panel> {
        Panel::ALL.into_iter().filter(|p| self.is_open(*p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_shows_node_panel_only() {
        let nav = Navigation::default();
        assert_eq!(nav.open_panels(), vec![Panel::Node]);
    }

    #[test]
    fn test_toggle() {
        let mut nav = Navigation::default();
        assert!(nav.toggle(Panel::Toml));
        assert!(nav.toggle(Panel::Debug));
        assert!(!nav.toggle(Panel::Node));
        assert_eq!(nav.open_panels(), vec![Panel::Debug, Panel::Toml]);
    }

    #[test]
    fn test_width_fractions() {
        assert_eq!(Panel::Toml.width_fraction(), (1, 2));
        assert_eq!(Panel::Settings.width_fraction(), (1, 4));
    }
}
