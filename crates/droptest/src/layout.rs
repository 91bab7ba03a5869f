//! Normalized impact-location grids on the device surface.
//!
//! Coordinates are percentages of the part extent: `(0, 0)` and `(100, 100)` are
//! opposite corners. Without margin the outer points sit on the boundary; with the edge
//! margin every point is inset by half the inter-point spacing.

use serde::{Deserialize, Serialize};

/// Impact point in percent of the part extent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

impl Location {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_on_part(&self) -> bool {
        (0.0..=100.0).contains(&self.x) && (0.0..=100.0).contains(&self.y)
    }

    /// Clamp both coordinates into `[0, 100]`.
    pub fn clamped(self) -> Self {
        Self::new(self.x.clamp(0.0, 100.0), self.y.clamp(0.0, 100.0))
    }
}

/// Rows × columns layout of a percentage grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridLayout {
    pub rows: usize,
    pub cols: usize,
    pub edge_margin: bool,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            rows: 3,
            cols: 3,
            edge_margin: false,
        }
    }
}

impl GridLayout {
    /// Layout holding at least `n` points (see [`calculate_grid_dimensions`]).
    pub fn for_count(n: usize, edge_margin: bool) -> Self {
        let (rows, cols) = calculate_grid_dimensions(n);
        Self {
            rows,
            cols,
            edge_margin,
        }
    }

    pub fn point_count(&self) -> usize {
        self.rows.saturating_mul(self.cols)
    }

    pub fn locations(&self) -> Vec<Location> {
        generate_grid_locations(self.rows, self.cols, self.edge_margin)
    }
}

/// Position of index `i` of `n` along one axis, in percent.
fn axis_position(i: usize, n: usize, edge_margin: bool) -> f64 {
    if n <= 1 {
        return 50.0;
    }
    let span = (n - 1) as f64;
    let t = i as f64 / span;
    if edge_margin {
        let margin = (100.0 / span) / 2.0;
        margin + t * (100.0 - 2.0 * margin)
    } else {
        t * 100.0
    }
}

/// Row-major `rows × cols` grid of locations.
///
/// A dimension of 1 is centered at 50. With `edge_margin`, points of a dimension `n > 1`
/// map into `[m, 100 - m]` with `m = (100 / (n - 1)) / 2`.
pub fn generate_grid_locations(rows: usize, cols: usize, edge_margin: bool) -> Vec<Location> {
    let mut out = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        let y = axis_position(r, rows, edge_margin);
        for c in 0..cols {
            out.push(Location::new(axis_position(c, cols, edge_margin), y));
        }
    }
    out
}

/// `(rows, cols)` with `cols = floor(sqrt(n))` and `rows = ceil(n / cols)`.
///
/// `n = 0` maps to `(0, 0)`.
pub fn calculate_grid_dimensions(n: usize) -> (usize, usize) {
    if n == 0 {
        return (0, 0);
    }
    let fits = |c: usize| c.checked_mul(c).is_some_and(|sq| sq <= n);
    // The float root can land one off either way for large n.
    let mut cols = ((n as f64).sqrt().floor() as usize).max(1);
    while !fits(cols) {
        cols -= 1;
    }
    if fits(cols + 1) {
        cols += 1;
    }
    let rows = n.div_ceil(cols);
    (rows, cols)
}
