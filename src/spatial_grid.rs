/*
 * Spatial Grid Module
 *
 * This module defines the SpatialGrid struct for finding connection
 * candidates. It divides the world into square cells at least as large as
 * the maximum connection distance, so any pair close enough to connect sits
 * in the same or adjacent cells.
 *
 * Optimized for performance by:
 * - Reusing cell buckets between ticks instead of reallocating
 * - Clamping out-of-bounds positions to the edge cells (clamping never
 *   pushes two nodes further apart than one cell)
 * - Capping the grid at MAX_CELLS_PER_AXIS cells along the longer side, so a
 *   tiny connection distance widens the cells instead of allocating millions
 */

use crate::node::Node;
use crate::world::Bounds;

/// Upper bound on columns or rows
pub const MAX_CELLS_PER_AXIS: usize = 256;

pub struct SpatialGrid {
    pub cell_size: f32,
    pub columns: usize,
    pub rows: usize,
    cells: Vec<Vec<usize>>,
    half_width: f32,
    half_height: f32,
}

impl SpatialGrid {
    pub fn new(cell_size: f32, bounds: Bounds) -> Self {
        let mut grid = Self {
            cell_size,
            columns: 0,
            rows: 0,
            cells: Vec::new(),
            half_width: 0.0,
            half_height: 0.0,
        };
        grid.resize(cell_size, bounds);
        grid
    }

    // Recompute the grid dimensions if the cell size or world changed. The
    // cell size used may be larger than requested, never smaller.
    pub fn resize(&mut self, cell_size: f32, bounds: Bounds) {
        let longest = bounds.width().max(bounds.height());
        let cell_size = cell_size.max(longest / MAX_CELLS_PER_AXIS as f32);
        let unchanged = self.cell_size == cell_size
            && self.half_width == bounds.half_width
            && self.half_height == bounds.half_height
            && !self.cells.is_empty();
        if unchanged {
            return;
        }

        self.cell_size = cell_size;
        self.half_width = bounds.half_width;
        self.half_height = bounds.half_height;
        self.columns = cells_along(bounds.width(), cell_size);
        self.rows = cells_along(bounds.height(), cell_size);
        self.cells = vec![Vec::new(); self.columns * self.rows];
    }

    #[inline]
    fn cell_coords(&self, x: f32, y: f32) -> (usize, usize) {
        let col = ((x + self.half_width) / self.cell_size).floor();
        let row = ((y + self.half_height) / self.cell_size).floor();
        (
            col.clamp(0.0, self.columns as f32 - 1.0) as usize,
            row.clamp(0.0, self.rows as f32 - 1.0) as usize,
        )
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    // Bucket every node whose index passes the filter
    pub fn rebuild(&mut self, nodes: &[Node], include: impl Fn(usize) -> bool) {
        self.clear();
        for (i, node) in nodes.iter().enumerate() {
            if include(i) {
                let (col, row) = self.cell_coords(node.x, node.y);
                self.cells[row * self.columns + col].push(i);
            }
        }
    }

    /// Every pair (i, j) with i < j that shares a cell or sits in adjacent
    /// cells, sorted ascending.
    pub fn candidate_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();

        for row in 0..self.rows {
            for col in 0..self.columns {
                let cell = &self.cells[row * self.columns + col];
                if cell.is_empty() {
                    continue;
                }

                // Check the cell and its neighbors (3x3 grid)
                for neighbor_row in row.saturating_sub(1)..=(row + 1).min(self.rows - 1) {
                    for neighbor_col in col.saturating_sub(1)..=(col + 1).min(self.columns - 1) {
                        let neighbor = &self.cells[neighbor_row * self.columns + neighbor_col];
                        for &i in cell {
                            for &j in neighbor {
                                if i < j {
                                    pairs.push((i, j));
                                }
                            }
                        }
                    }
                }
            }
        }

        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }
}

fn cells_along(extent: f32, cell_size: f32) -> usize {
    if cell_size > 0.0 && extent > 0.0 {
        ((extent / cell_size).ceil() as usize).max(1)
    } else {
        1
    }
}
