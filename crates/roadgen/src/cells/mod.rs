//! Uniform-grid spatial index over city space.
//!
//! Purpose
//! - Owns every accepted node and edge of a generation run (arena storage) and
//!   sorts them into square cells for localized neighbor and intersection
//!   queries.
//!
//! Invariants
//! - A node lives in exactly one cell: the one containing its position.
//! - An edge is listed in every cell its segment touches (closed rectangles, so
//!   an edge running along a cell border is listed on both sides).
//! - Ids are arena indices, handed out in insertion order.
//! - Mutation goes through `insert_node`/`insert_edge` only; queries borrow.
//!
//! Cell numbering is row-major: `row * cols + col`, with
//! `row = floor(y / cell_width)` and `col = floor(x / cell_width)`. Points on
//! the far city border belong to the last row/column.

use std::collections::HashSet;

use nalgebra::Vector2;

use crate::config::ConfigError;
use crate::geom::{approx_eq, Point, Rect};
use crate::network::{Edge, EdgeId, Node, NodeId};

#[derive(Clone, Debug)]
pub struct CellIndex {
    width: f64,
    height: f64,
    cols: usize,
    rows: usize,
    cell_width: f64,
    node_eps: f64,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    node_cells: Vec<Vec<NodeId>>,
    edge_cells: Vec<Vec<EdgeId>>,
}

impl CellIndex {
    /// Index over `[0, width] × [0, height]` with `cols` cells per row.
    ///
    /// Cells are square (`cell_width = width / cols`); `rows` must cover the
    /// height with the same width.
    pub fn new(
        width: f64,
        height: f64,
        cols: usize,
        rows: usize,
        node_eps: f64,
    ) -> Result<Self, ConfigError> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(ConfigError::invalid("city dimensions must be finite and > 0"));
        }
        if cols == 0 || rows == 0 {
            return Err(ConfigError::invalid("grid needs at least one cell per axis"));
        }
        let cell_width = width / cols as f64;
        if ((height / cell_width) - rows as f64).abs() > 1e-6 * rows as f64 {
            return Err(ConfigError::invalid(
                "grid rows must match city height for square cells",
            ));
        }
        if !(node_eps.is_finite()) || node_eps <= 0.0 {
            return Err(ConfigError::invalid("node_eps must be > 0"));
        }
        let n = cols * rows;
        Ok(Self {
            width,
            height,
            cols,
            rows,
            cell_width,
            node_eps,
            nodes: Vec::new(),
            edges: Vec::new(),
            node_cells: vec![Vec::new(); n],
            edge_cells: vec![Vec::new(); n],
        })
    }

    /// Drop every node and edge, keeping the grid layout.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.node_cells.iter_mut().for_each(Vec::clear);
        self.edge_cells.iter_mut().for_each(Vec::clear);
    }

    #[inline]
    pub fn cell_width(&self) -> f64 {
        self.cell_width
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cols * self.rows
    }

    #[inline]
    pub fn node_eps(&self) -> f64 {
        self.node_eps
    }

    /// True if `p` lies outside `[0, width] × [0, height]`.
    #[inline]
    pub fn out_of_bounds(&self, p: Point) -> bool {
        !(p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height)
    }

    /// Geometric center of city space.
    #[inline]
    pub fn center(&self) -> Point {
        Vector2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Unclamped (column, row) of a point; may lie outside the grid.
    #[inline]
    fn col_row(&self, p: Point) -> (i64, i64) {
        (
            (p.x / self.cell_width).floor() as i64,
            (p.y / self.cell_width).floor() as i64,
        )
    }

    /// Row index of an in-bounds point.
    pub fn row_of(&self, p: Point) -> Option<usize> {
        self.cell_coords(p).map(|(_, r)| r)
    }

    /// Column index of an in-bounds point.
    pub fn col_of(&self, p: Point) -> Option<usize> {
        self.cell_coords(p).map(|(c, _)| c)
    }

    fn cell_coords(&self, p: Point) -> Option<(usize, usize)> {
        if self.out_of_bounds(p) {
            return None;
        }
        let (c, r) = self.col_row(p);
        let c = (c.max(0) as usize).min(self.cols - 1);
        let r = (r.max(0) as usize).min(self.rows - 1);
        Some((c, r))
    }

    /// Cell number of an in-bounds point; `None` outside city space.
    pub fn cell_number(&self, p: Point) -> Option<usize> {
        self.cell_coords(p).map(|(c, r)| r * self.cols + c)
    }

    /// Closed rectangle covered by cell `(col, row)`.
    #[inline]
    pub fn cell_rect(&self, col: usize, row: usize) -> Rect {
        let w = self.cell_width;
        Rect::new(
            Vector2::new(col as f64 * w, row as f64 * w),
            Vector2::new((col + 1) as f64 * w, (row + 1) as f64 * w),
        )
    }

    /// Cells touched by the segment `a–b`, in row-major order.
    ///
    /// Sweeps the bounding rows/columns of the two endpoints (clamped to the
    /// grid) and keeps the cells whose rectangle the segment intersects.
    pub fn cells_for_segment(&self, a: Point, b: Point) -> Vec<usize> {
        let (ca, ra) = self.col_row(a);
        let (cb, rb) = self.col_row(b);
        let max_c = self.cols as i64 - 1;
        let max_r = self.rows as i64 - 1;
        let (lo_c, hi_c) = (ca.min(cb).max(0), ca.max(cb).min(max_c));
        let (lo_r, hi_r) = (ra.min(rb).max(0), ra.max(rb).min(max_r));
        let mut out = Vec::new();
        if lo_c > hi_c || lo_r > hi_r {
            return out;
        }
        for row in lo_r..=hi_r {
            for col in lo_c..=hi_c {
                let rect = self.cell_rect(col as usize, row as usize);
                if rect.intersects_segment(a, b) {
                    out.push(row as usize * self.cols + col as usize);
                }
            }
        }
        out
    }

    #[inline]
    pub fn cells_for_edge(&self, e: &Edge) -> Vec<usize> {
        self.cells_for_segment(e.endpoint1, e.endpoint2)
    }

    /// Cell numbers of the 3×3 block around the cell containing `p`.
    pub fn neighborhood(&self, p: Point) -> Vec<usize> {
        let Some((c, r)) = self.cell_coords(p) else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(9);
        for row in r.saturating_sub(1)..=(r + 1).min(self.rows - 1) {
            for col in c.saturating_sub(1)..=(c + 1).min(self.cols - 1) {
                out.push(row * self.cols + col);
            }
        }
        out
    }

    /// Node within tolerance of `p`, searching only `p`'s own cell.
    pub fn node_at(&self, p: Point) -> Option<&Node> {
        let cell = self.cell_number(p)?;
        self.node_cells[cell]
            .iter()
            .map(move |id| &self.nodes[id.0])
            .find(|n| approx_eq(n.position, p, self.node_eps))
    }

    /// Nearest node to `p` within the 3×3 cell block, skipping positions for
    /// which `exclude` returns true.
    pub fn nearest_node(&self, p: Point, exclude: impl Fn(&Node) -> bool) -> Option<&Node> {
        let mut best: Option<(&Node, f64)> = None;
        for cell in self.neighborhood(p) {
            for id in &self.node_cells[cell] {
                let n = &self.nodes[id.0];
                if exclude(n) {
                    continue;
                }
                let d = n.distance_from(p);
                if best.map_or(true, |(_, bd)| d < bd) {
                    best = Some((n, d));
                }
            }
        }
        best.map(|(n, _)| n)
    }

    /// Distinct edges listed in any of `cells`, in first-seen order.
    pub fn edges_in_cells(&self, cells: &[usize]) -> Vec<&Edge> {
        let mut seen: HashSet<EdgeId> = HashSet::new();
        cells
            .iter()
            .filter_map(|&cell| self.edge_cells.get(cell))
            .flatten()
            .filter(|&&id| seen.insert(id))
            .map(|id| &self.edges[id.0])
            .collect()
    }

    /// Distinct edges listed in the 3×3 block around `p`.
    pub fn edges_near(&self, p: Point) -> Vec<&Edge> {
        self.edges_in_cells(&self.neighborhood(p))
    }

    #[inline]
    pub fn nodes_in_cell(&self, cell: usize) -> impl Iterator<Item = &Node> {
        self.node_cells
            .get(cell)
            .into_iter()
            .flatten()
            .map(move |id| &self.nodes[id.0])
    }

    #[inline]
    pub fn edges_in_cell(&self, cell: usize) -> impl Iterator<Item = &Edge> {
        self.edge_cells
            .get(cell)
            .into_iter()
            .flatten()
            .map(move |id| &self.edges[id.0])
    }

    /// Store a node at `p` unless it is out of bounds or an existing node in its
    /// cell matches within tolerance.
    pub fn insert_node(&mut self, p: Point) -> Option<NodeId> {
        let cell = self.cell_number(p)?;
        let dup = self.node_cells[cell]
            .iter()
            .any(|id| approx_eq(self.nodes[id.0].position, p, self.node_eps));
        if dup {
            return None;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(id, p));
        self.node_cells[cell].push(id);
        Some(id)
    }

    /// Existing node at `p`, or a new one; `None` only outside city space.
    pub fn node_or_insert(&mut self, p: Point) -> Option<NodeId> {
        if let Some(n) = self.node_at(p) {
            return Some(n.id);
        }
        self.insert_node(p)
    }

    /// Store an edge in every cell it touches; rejected if it touches none.
    pub fn insert_edge(&mut self, mut edge: Edge) -> Option<EdgeId> {
        let cells = self.cells_for_edge(&edge);
        if cells.is_empty() {
            return None;
        }
        let id = EdgeId(self.edges.len());
        edge.id = id;
        self.edges.push(edge);
        for cell in cells {
            self.edge_cells[cell].push(id);
        }
        Some(id)
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[inline]
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0]
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }
}
