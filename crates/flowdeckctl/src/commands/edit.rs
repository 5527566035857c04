//! Terminal flow editor
//!
//! Canvas on the left, toggleable panels on the right. Log output is
//! captured into the debug panel instead of the terminal.

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io::{self, Write};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use flowdeck_core::{FlowdeckConfig, Position};
use flowdeck_editor::{
    AnchorRect, Area, Connection, DragPayload, DropEffect, EditorLayout, FlowEditor, NodeChange, Panel,
};
use flowdeck_store::FlowStore;
use flowdeck_viz::{CanvasRenderer, RenderConfig, CELL_HEIGHT, CELL_WIDTH};

/// Log writer that sends log lines to an mpsc channel
struct LogWriter(Arc<Mutex<Sender<String>>>);

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        if let Ok(tx) = self.0.lock() {
            for line in text.lines().filter(|l| !l.is_empty()) {
                let _ = tx.send(line.to_string());
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// What the event loop should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    None,
    Quit,
    Save,
    Reload,
}

/// Editor state plus the bits only the terminal front-end needs
pub struct EditorApp {
    pub editor: FlowEditor,
    renderer: CanvasRenderer,
    palette_index: usize,
    /// Drop cursor, in cells relative to the canvas interior
    cursor: (u16, u16),
    /// Source picked with the first `c` press
    pending_source: Option<String>,
    quit_armed: bool,
    status: String,
    layout: EditorLayout,
    canvas_inner: Rect,
}

impl EditorApp {
    pub fn new(editor: FlowEditor) -> Self {
        let mut renderer = CanvasRenderer::new(RenderConfig::terminal(), Default::default());
        renderer.viewport = editor.graph.viewport;
        let layout = editor.layout(Area::default());
        Self {
            editor,
            renderer,
            palette_index: 0,
            cursor: (1, 1),
            pending_source: None,
            quit_armed: false,
            status: String::new(),
            layout,
            canvas_inner: Rect::default(),
        }
    }

    /// Recompute the layout and the drop anchor for a terminal of `size`
    pub fn resize(&mut self, size: Rect) {
        self.layout = self
            .editor
            .layout(Area::new(size.x, size.y, size.width, size.height));
        let canvas = to_rect(self.layout.canvas);
        self.canvas_inner = Block::default().borders(Borders::ALL).inner(canvas);
        let inner = self.canvas_inner;
        self.editor
            .set_anchor(AnchorRect::from_cells(inner.x, inner.y, inner.width, inner.height));
        self.cursor.0 = self.cursor.0.min(inner.width.saturating_sub(1));
        self.cursor.1 = self.cursor.1.min(inner.height.saturating_sub(1));
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    fn selected_palette_type(&self) -> Option<String> {
        self.editor
            .registry()
            .palette()
            .get(self.palette_index)
            .map(|t| t.name.clone())
    }

    fn selected_node_id(&self) -> Option<String> {
        self.editor.graph.selected_nodes().first().map(|n| n.id.clone())
    }

    /// Drop the palette's current type at the cursor
    fn drop_at_cursor(&mut self) {
        let Some(node_type) = self.selected_palette_type() else {
            return;
        };
        let payload = DragPayload::new(node_type);
        if self.editor.on_drag_over(&payload) == DropEffect::None {
            return;
        }
        let point = Position::new(
            (self.canvas_inner.x + self.cursor.0) as f64 * CELL_WIDTH,
            (self.canvas_inner.y + self.cursor.1) as f64 * CELL_HEIGHT,
        );
        match self.editor.on_drop(&payload, point) {
            Ok(id) => {
                self.editor.graph.select_only(Some(&id));
                self.set_status(format!("Added {}", self.editor.registry().label(&payload.node_type)));
            }
            Err(e) => self.set_status(e.to_string()),
        }
    }

    fn connect(&mut self) {
        let Some(selected) = self.selected_node_id() else {
            self.set_status("Select a node first (Tab)");
            return;
        };
        match self.pending_source.take() {
            None => {
                self.set_status(format!("Connecting from {}; select target and press c", selected));
                self.pending_source = Some(selected);
            }
            Some(source) => match self.editor.on_connect(Connection::new(source, selected)) {
                Ok(id) => self.set_status(format!("Added {}", id)),
                Err(e) => self.set_status(e.to_string()),
            },
        }
    }

    fn move_selected_or_cursor(&mut self, cols: i64, rows: i64) {
        match self.selected_node_id() {
            Some(id) => {
                let Some(node) = self.editor.graph.node(&id) else {
                    return;
                };
                let zoom = self.editor.graph.viewport.zoom;
                let position = Position::new(
                    node.position.x + cols as f64 * CELL_WIDTH / zoom,
                    node.position.y + rows as f64 * CELL_HEIGHT / zoom,
                );
                self.editor
                    .on_nodes_change(vec![NodeChange::Position { id, position }]);
            }
            None => {
                let max_x = self.canvas_inner.width.saturating_sub(1) as i64;
                let max_y = self.canvas_inner.height.saturating_sub(1) as i64;
                self.cursor.0 = (self.cursor.0 as i64 + cols).clamp(0, max_x) as u16;
                self.cursor.1 = (self.cursor.1 as i64 + rows).clamp(0, max_y) as u16;
            }
        }
    }

    fn sync_viewport(&mut self) {
        self.renderer.viewport = self.editor.graph.viewport;
    }

    fn toggle(&mut self, panel: Panel) {
        let open = self.editor.navigation.toggle(panel);
        self.set_status(format!("{} panel {}", panel.title(), if open { "shown" } else { "hidden" }));
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyAction {
        let quit_armed = std::mem::take(&mut self.quit_armed);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return KeyAction::Quit,
            KeyCode::Char('q') | KeyCode::Esc => {
                if self.editor.graph.is_dirty() && !quit_armed {
                    self.quit_armed = true;
                    self.set_status("Unsaved changes. Press q again to quit, s to save");
                } else {
                    return KeyAction::Quit;
                }
            }
            KeyCode::Char('s') => return KeyAction::Save,
            KeyCode::Char('r') => return KeyAction::Reload,
            KeyCode::Char('1') => self.toggle(Panel::Node),
            KeyCode::Char('2') => self.toggle(Panel::Debug),
            KeyCode::Char('3') => self.toggle(Panel::Settings),
            KeyCode::Char('4') => self.toggle(Panel::Toml),
            KeyCode::Tab => {
                if let Some(id) = self.editor.graph.select_next() {
                    self.set_status(format!("Selected {}", id));
                }
            }
            KeyCode::BackTab => {
                self.editor.graph.select_only(None);
                self.pending_source = None;
                self.set_status("Selection cleared");
            }
            KeyCode::Char('[') => {
                self.palette_index = self.palette_index.saturating_sub(1);
            }
            KeyCode::Char(']') => {
                let last = self.editor.registry().count().saturating_sub(1);
                self.palette_index = (self.palette_index + 1).min(last);
            }
            KeyCode::Enter => self.drop_at_cursor(),
            KeyCode::Char('c') => self.connect(),
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Some(id) = self.selected_node_id() {
                    self.editor.on_nodes_change(vec![NodeChange::Remove { id: id.clone() }]);
                    self.set_status(format!("Removed {}", id));
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.editor.graph.viewport.zoom_by(1.25);
                self.sync_viewport();
            }
            KeyCode::Char('-') => {
                self.editor.graph.viewport.zoom_by(0.8);
                self.sync_viewport();
            }
            KeyCode::Left if shift => self.pan(1, 0),
            KeyCode::Right if shift => self.pan(-1, 0),
            KeyCode::Up if shift => self.pan(0, 1),
            KeyCode::Down if shift => self.pan(0, -1),
            KeyCode::Left => self.move_selected_or_cursor(-1, 0),
            KeyCode::Right => self.move_selected_or_cursor(1, 0),
            KeyCode::Up => self.move_selected_or_cursor(0, -1),
            KeyCode::Down => self.move_selected_or_cursor(0, 1),
            _ => {}
        }
        KeyAction::None
    }

    fn pan(&mut self, cols: i64, rows: i64) {
        self.editor.graph.viewport.pan_cells(cols, rows);
        self.sync_viewport();
    }
}

fn to_rect(area: Area) -> Rect {
    Rect::new(area.x, area.y, area.width, area.height)
}

/// Open `flow_name` in the terminal editor
pub async fn execute(store: FlowStore, flow_name: &str, config: &FlowdeckConfig) -> Result<()> {
    let (log_tx, log_rx) = channel::<String>();
    let log_tx = Arc::new(Mutex::new(log_tx));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(move || LogWriter(log_tx.clone()))
        .with_ansi(false)
        .with_level(true)
        .with_target(false);
    let _ = tracing_subscriber::registry()
        .with(fmt_layer)
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .try_init();

    let editor = FlowEditor::open(&store, flow_name)
        .await
        .with_context(|| format!("Failed to open flow '{}'", flow_name))?;

    let store = Arc::new(store);
    // External edits refresh the settings and flow.toml panels
    let watch = match store.watch(config.watch.poll_interval()).await {
        Ok(watch) => Some(watch),
        Err(e) => {
            tracing::warn!("File watching disabled: {}", e);
            None
        }
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        default_hook(panic_info);
    }));

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = EditorApp::new(editor);
    let (handle, batches) = match watch {
        Some((handle, batches)) => (Some(handle), Some(batches)),
        None => (None, None),
    };
    let result = run_loop(&mut terminal, &mut app, &store, log_rx, batches).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    if let Some(handle) = handle {
        handle.stop().await;
    }

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut EditorApp,
    store: &FlowStore,
    log_rx: Receiver<String>,
    mut batches: Option<tokio::sync::mpsc::Receiver<flowdeck_store::WatchBatch>>,
) -> Result<()> {
    loop {
        while let Ok(line) = log_rx.try_recv() {
            app.editor.log(line);
        }
        if let Some(rx) = batches.as_mut() {
            let mut changed = false;
            while let Ok(batch) = rx.try_recv() {
                changed |= batch.iter().any(|e| flowdeck_store::is_flow_document(&e.path));
            }
            if changed {
                app.editor.refresh_panels(store).await;
            }
        }

        app.resize(terminal.size()?);
        terminal.draw(|f| render(f, app))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        match app.handle_key(key) {
            KeyAction::None => {}
            KeyAction::Quit => break,
            KeyAction::Save => match app.editor.save(store).await {
                Ok(()) => app.set_status("Saved"),
                Err(e) => app.set_status(format!("Save failed: {}", e)),
            },
            KeyAction::Reload => match app.editor.reload(store).await {
                Ok(()) => {
                    app.sync_viewport();
                    app.set_status("Reloaded from disk");
                }
                Err(e) => app.set_status(format!("Reload failed: {}", e)),
            },
        }
    }
    Ok(())
}

fn render(f: &mut Frame, app: &EditorApp) {
    render_header(f, app, to_rect(app.layout.header));
    render_canvas(f, app, to_rect(app.layout.canvas));
    for (panel, area) in &app.layout.panels {
        let area = to_rect(*area);
        match panel {
            Panel::Node => render_palette(f, app, area),
            Panel::Debug => render_debug(f, app, area),
            Panel::Settings => render_text(
                f,
                panel.title(),
                app.editor
                    .settings()
                    .and_then(|s| s.to_toml_string().ok())
                    .unwrap_or_else(|| "(unavailable)".to_string()),
                area,
            ),
            Panel::Toml => render_text(
                f,
                panel.title(),
                app.editor.source().unwrap_or("(unavailable)").to_string(),
                area,
            ),
        }
    }
}

fn render_header(f: &mut Frame, app: &EditorApp, area: Rect) {
    let graph = &app.editor.graph;
    let dirty = if graph.is_dirty() { " [modified]" } else { "" };
    let line = Line::from(vec![
        Span::styled(
            format!(" {}{} ", app.editor.flow_name(), dirty),
            Style::default().fg(Color::White).bg(Color::DarkGray).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " {} nodes │ {} edges │ zoom {:.2} │ ",
            graph.nodes().len(),
            graph.edges().len(),
            graph.viewport.zoom
        )),
        Span::styled(app.status().to_string(), Style::default().fg(Color::Yellow)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_canvas(f: &mut Frame, app: &EditorApp, area: Rect) {
    let block = Block::default()
        .title(" Canvas │ Enter drop │ Tab select │ c connect │ x delete │ s save │ 1-4 panels │ q quit ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::White));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines: Vec<Line> = app
        .editor
        .render_canvas(&app.renderer, inner.width as usize, inner.height as usize)
        .into_iter()
        .map(Line::from)
        .collect();
    f.render_widget(Paragraph::new(lines), inner);

    if app.editor.graph.selected_nodes().is_empty() && inner.width > 0 && inner.height > 0 {
        let x = inner.x + app.cursor.0;
        let y = inner.y + app.cursor.1;
        f.buffer_mut()
            .get_mut(x, y)
            .set_char('+')
            .set_style(Style::default().fg(Color::Cyan));
    }
}

fn render_palette(f: &mut Frame, app: &EditorApp, area: Rect) {
    let items: Vec<ListItem> = app
        .editor
        .registry()
        .palette()
        .into_iter()
        .map(|t| ListItem::new(format!("{} ({})", t.label, t.name)))
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .title(format!(" {} [ ] ", Panel::Node.title()))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded),
        )
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .highlight_symbol("▸ ");
    let mut state = ListState::default().with_selected(Some(app.palette_index));
    f.render_stateful_widget(list, area, &mut state);
}

fn render_debug(f: &mut Frame, app: &EditorApp, area: Rect) {
    let block = Block::default()
        .title(format!(" {} │ {} ", Panel::Debug.title(), app.editor.debug_log().flow_name()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines: Vec<&str> = app.editor.debug_log().lines().collect();
    let items: Vec<ListItem> = lines
        .iter()
        .rev()
        .take(inner.height as usize)
        .rev()
        .map(|line| {
            let style = if line.contains("ERROR") {
                Style::default().fg(Color::Red)
            } else if line.contains("WARN") {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::Gray)
            };
            ListItem::new(*line).style(style)
        })
        .collect();
    f.render_widget(List::new(items), inner);
}

fn render_text(f: &mut Frame, title: &str, text: String, area: Rect) {
    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .title(format!(" {} ", title))
                .title_alignment(Alignment::Left)
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}
