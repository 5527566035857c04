//! Character-grid canvas
//!
//! Node positions are in flow units. The [`Viewport`] maps them to screen
//! units (pan then zoom), and screen units map to grid cells through
//! [`CELL_WIDTH`] x [`CELL_HEIGHT`].

use crate::node::NodeRenderer;
use crate::RenderConfig;
use flowdeck_core::{GraphEdge, GraphNode, Position};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Screen units covered by one terminal column
pub const CELL_WIDTH: f64 = 8.0;
/// Screen units covered by one terminal row
pub const CELL_HEIGHT: f64 = 16.0;

const MIN_ZOOM: f64 = 0.1;
const MAX_ZOOM: f64 = 4.0;

/// Nodes whose cell lies further out than this are not drawn
const MAX_CELL: i64 = i32::MAX as i64;

/// Marks the second column of a double-width character
const WIDE_TAIL: char = '\0';

/// Pan and zoom of the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(x: f64, y: f64, zoom: f64) -> Self {
        Self {
            x,
            y,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        }
    }

    /// Flow coordinates to screen coordinates
    pub fn project(&self, pos: Position) -> Position {
        Position::new(pos.x * self.zoom + self.x, pos.y * self.zoom + self.y)
    }

    /// Screen coordinates to flow coordinates
    pub fn unproject(&self, screen: Position) -> Position {
        Position::new((screen.x - self.x) / self.zoom, (screen.y - self.y) / self.zoom)
    }

    /// Grid cell a flow position lands in. Saturates for out-of-range
    /// positions; NaN maps to 0.
    pub fn to_cell(&self, pos: Position) -> (i64, i64) {
        let screen = self.project(pos);
        (
            (screen.x / CELL_WIDTH).floor() as i64,
            (screen.y / CELL_HEIGHT).floor() as i64,
        )
    }

    pub fn pan_cells(&mut self, cols: i64, rows: i64) {
        self.x += cols as f64 * CELL_WIDTH;
        self.y += rows as f64 * CELL_HEIGHT;
    }

    pub fn zoom_by(&mut self, factor: f64) {
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
    }
}

/// One node to place on the canvas
pub struct CanvasItem<'a> {
    pub node: &'a GraphNode,
    pub selected: bool,
    pub renderer: &'a dyn NodeRenderer,
}

struct Placed {
    id: String,
    col: i64,
    row: i64,
    lines: Vec<String>,
    width: i64,
}

struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Vec<char>>,
}

impl Grid {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![vec![' '; width]; height],
        }
    }

    fn in_bounds(&self, col: i64, row: i64) -> bool {
        col >= 0 && row >= 0 && (col as usize) < self.width && (row as usize) < self.height
    }

    fn is_empty(&self, col: i64, row: i64) -> bool {
        self.in_bounds(col, row) && self.cells[row as usize][col as usize] == ' '
    }

    fn put_if_empty(&mut self, col: i64, row: i64, c: char) {
        if self.is_empty(col, row) {
            self.cells[row as usize][col as usize] = c;
        }
    }

    fn put_str(&mut self, col: i64, row: i64, text: &str) {
        if row < 0 || row as usize >= self.height {
            return;
        }
        let mut x = col;
        for c in text.chars() {
            if x >= self.width as i64 {
                break;
            }
            let w = c.width().unwrap_or(0) as i64;
            if w == 0 {
                continue;
            }
            // A wide char clipped at either edge is dropped whole
            if self.in_bounds(x, row) && self.in_bounds(x + w - 1, row) {
                self.cells[row as usize][x as usize] = c;
                if w == 2 {
                    self.cells[row as usize][(x + 1) as usize] = WIDE_TAIL;
                }
            }
            x += w;
        }
    }

    fn into_lines(self) -> Vec<String> {
        self.cells
            .into_iter()
            .map(|row| row.into_iter().filter(|c| *c != WIDE_TAIL).collect())
            .collect()
    }
}

/// Lays nodes out on a character grid by position
#[derive(Debug, Clone, Default)]
pub struct CanvasRenderer {
    pub config: RenderConfig,
    pub viewport: Viewport,
}

impl CanvasRenderer {
    pub fn new(config: RenderConfig, viewport: Viewport) -> Self {
        Self { config, viewport }
    }

    /// Render a `width` x `height` grid. Edges are drawn under nodes, on
    /// empty cells only.
    pub fn render(&self, items: &[CanvasItem<'_>], edges: &[GraphEdge], width: usize, height: usize) -> Vec<String> {
        let mut grid = Grid::new(width, height);

        let placed: Vec<Placed> = items
            .iter()
            .filter_map(|item| {
                let (col, row) = self.viewport.to_cell(item.node.position);
                let range = -MAX_CELL..=MAX_CELL;
                if !range.contains(&col) || !range.contains(&row) {
                    return None;
                }
                let lines = item.renderer.render(item.node, item.selected, &self.config);
                let width = lines
                    .first()
                    .map(|l| l.width())
                    .unwrap_or(0) as i64;
                Some(Placed {
                    id: item.node.id.clone(),
                    col,
                    row,
                    lines,
                    width,
                })
            })
            .collect();

        for edge in edges {
            let source = placed.iter().find(|p| p.id == edge.source);
            let target = placed.iter().find(|p| p.id == edge.target);
            if let (Some(source), Some(target)) = (source, target) {
                self.route_edge(&mut grid, source, target);
            }
        }

        for node in &placed {
            for (i, line) in node.lines.iter().enumerate() {
                grid.put_str(node.col, node.row + i as i64, line);
            }
        }

        grid.into_lines()
    }

    /// Elbow from the right side of `source` to the left side of `target`
    fn route_edge(&self, grid: &mut Grid, source: &Placed, target: &Placed) {
        let (horizontal, vertical, arrow) = if self.config.use_unicode {
            ('─', '│', '▶')
        } else {
            ('-', '|', '>')
        };

        let start_col = source.col + source.width;
        let start_row = source.row + source.lines.len() as i64 / 2;
        let end_col = target.col - 1;
        let end_row = target.row + target.lines.len() as i64 / 2;
        let bend_col = if end_col > start_col {
            start_col + (end_col - start_col) / 2
        } else {
            start_col
        };

        // Segments are walked only over the part that intersects the grid
        let last_col = grid.width as i64 - 1;
        let last_row = grid.height as i64 - 1;

        grid.put_if_empty(end_col, end_row, arrow);
        for col in start_col.max(0)..=bend_col.min(last_col) {
            grid.put_if_empty(col, start_row, horizontal);
        }
        if (0..=last_col).contains(&bend_col) {
            let (top, bottom) = if start_row <= end_row {
                (start_row, end_row)
            } else {
                (end_row, start_row)
            };
            for row in top.max(0)..=bottom.min(last_row) {
                grid.put_if_empty(bend_col, row, vertical);
            }
        }
        let (left, right) = if bend_col <= end_col {
            (bend_col, end_col)
        } else {
            (end_col, bend_col)
        };
        for col in left.max(0)..=right.min(last_col) {
            grid.put_if_empty(col, end_row, horizontal);
        }
    }

    /// `source -> target` lines for every edge, for panels and plain output
    pub fn edge_summary(&self, edges: &[GraphEdge]) -> Vec<String> {
        let arrow = if self.config.use_unicode { "→" } else { "->" };
        edges
            .iter()
            .map(|e| format!("{} {} {}", e.source, arrow, e.target))
            .collect()
    }
}
