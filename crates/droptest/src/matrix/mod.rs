//! DOE × repeat direction grids.
//!
//! Model
//! - A grid has `doe` rows (independent test cases) and `repeat` columns (successive
//!   drops of one case). Rows must be pairwise distinct; entries within a row may repeat.
//! - New rows are cyclic rotations of a diverse base row, corrected by
//!   [`ensure_row_unique`] when they collide with rows built so far.
//!
//! Uniqueness
//! - `ensure_row_unique` is a bounded best-effort pass (`26 × repeat` perturbations).
//!   Exhaustion is reported as `Err(StillDuplicate)`, never as silent success.
//! - The grid builders follow an exhausted pass with an odometer scan through the
//!   canonical ordering. The scan needs at most `rows_so_far + 1` steps, so a free row
//!   is always found while the grid is below its `26^repeat` capacity. Beyond capacity
//!   the row stays duplicate and a `Notice::StillDuplicate` is attached.
//!
//! Resizing keeps every authored cell whose `(row, col)` is still in range.

use crate::direction::{Direction, DIRECTION_COUNT};
use crate::diversity::diverse_default_dirs;
use crate::notice::{Generated, Notice};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// One DOE row: the directions dropped in sequence.
pub type Row = Vec<Direction>;

/// Rectangular `doe × repeat` matrix of directions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoeGrid {
    pub rows: Vec<Row>,
}

impl DoeGrid {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    #[inline]
    pub fn doe_count(&self) -> usize {
        self.rows.len()
    }

    /// Column count of the first row (0 for an empty grid).
    #[inline]
    pub fn repeat_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn is_rectangular(&self) -> bool {
        let r = self.repeat_count();
        self.rows.iter().all(|row| row.len() == r)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<Direction> {
        self.rows.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Overwrite one cell. Returns `false` if `(row, col)` is out of range.
    pub fn set_cell(&mut self, row: usize, col: usize, dir: Direction) -> bool {
        match self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(c) => {
                *c = dir;
                true
            }
            None => false,
        }
    }

    /// Indices `(i, j)` with `i < j` of entry-wise equal rows.
    pub fn duplicate_pairs(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for i in 0..self.rows.len() {
            for j in (i + 1)..self.rows.len() {
                if self.rows[i] == self.rows[j] {
                    out.push((i, j));
                }
            }
        }
        out
    }

    pub fn iter_cells(&self) -> impl Iterator<Item = (usize, usize, Direction)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(i, r)| r.iter().enumerate().map(move |(j, d)| (i, j, *d)))
    }
}

/// Typed outcome of an exhausted uniqueness pass. `row` is the unchanged input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StillDuplicate {
    pub row: Row,
}

impl fmt::Display for StillDuplicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<&str> = self.row.iter().map(|d| d.code()).collect();
        write!(
            f,
            "row [{}] is still a duplicate after the bounded perturbation pass",
            codes.join(", ")
        )
    }
}

impl std::error::Error for StillDuplicate {}

/// Cyclic left rotation by `k` positions.
pub fn rotate<T: Clone>(arr: &[T], k: usize) -> Vec<T> {
    if arr.is_empty() {
        return Vec::new();
    }
    let k = k % arr.len();
    let mut out = Vec::with_capacity(arr.len());
    out.extend_from_slice(&arr[k..]);
    out.extend_from_slice(&arr[..k]);
    out
}

/// Number of distinct rows of length `repeat` (`26^repeat`), saturating.
pub fn unique_row_capacity(repeat: usize) -> u128 {
    u32::try_from(repeat)
        .ok()
        .and_then(|r| (DIRECTION_COUNT as u128).checked_pow(r))
        .unwrap_or(u128::MAX)
}

fn capacity_notice(repeat: usize, doe: usize) -> Option<Notice> {
    let cap = unique_row_capacity(repeat);
    if (doe as u128) > cap {
        tracing::warn!(repeat, doe, unique_rows = %cap, "doe count exceeds unique row capacity");
        Some(Notice::Capacity {
            repeat,
            doe,
            unique_rows: cap,
        })
    } else {
        None
    }
}

/// Return `row` unchanged if no row in `existing` equals it; otherwise perturb it.
///
/// Attempt `t` in `[0, 26 × max(1, len))` sets `row[t mod len]` to the direction
/// `floor(t / len) + 1` positions ahead of the original entry; replacements accumulate
/// across positions. The first candidate not in `existing` is returned.
pub fn ensure_row_unique(row: &[Direction], existing: &[Row]) -> Result<Row, StillDuplicate> {
    let seen: HashSet<Row> = existing.iter().cloned().collect();
    ensure_unique_in(row, &seen)
}

fn ensure_unique_in(row: &[Direction], seen: &HashSet<Row>) -> Result<Row, StillDuplicate> {
    if !seen.contains(row) {
        return Ok(row.to_vec());
    }
    let len = row.len();
    if len == 0 {
        return Err(StillDuplicate { row: Vec::new() });
    }
    let mut candidate = row.to_vec();
    for t in 0..DIRECTION_COUNT * len.max(1) {
        let pos = t % len;
        let shift = t / len + 1;
        candidate[pos] = row[pos].advance(shift);
        if !seen.contains(candidate.as_slice()) {
            return Ok(candidate);
        }
    }
    Err(StillDuplicate { row: row.to_vec() })
}

/// Step `row` through the canonical ordering like an odometer (position 0 is the
/// fastest digit) until it leaves `seen`. Gives up after `seen.len() + 1` steps.
fn odometer_scan(row: &[Direction], seen: &HashSet<Row>) -> Option<Row> {
    if row.is_empty() {
        return None;
    }
    let mut candidate = row.to_vec();
    for _ in 0..=seen.len() {
        for cell in candidate.iter_mut() {
            *cell = cell.advance(1);
            if *cell != Direction::ALL[0] {
                break;
            }
        }
        if candidate.as_slice() == row {
            return None;
        }
        if !seen.contains(candidate.as_slice()) {
            return Some(candidate);
        }
    }
    None
}

/// Running set of accepted rows used by the builders.
struct RowSet {
    rows: Vec<Row>,
    seen: HashSet<Row>,
    notices: Vec<Notice>,
}

impl RowSet {
    fn with_capacity(n: usize) -> Self {
        Self {
            rows: Vec::with_capacity(n),
            seen: HashSet::with_capacity(n),
            notices: Vec::new(),
        }
    }

    /// Accept `row` as is.
    fn push_verbatim(&mut self, row: Row) {
        self.seen.insert(row.clone());
        self.rows.push(row);
    }

    /// Accept `proposal`, corrected to be distinct from every accepted row if possible.
    fn push_unique(&mut self, proposal: Row) {
        let index = self.rows.len();
        let accepted = match ensure_unique_in(&proposal, &self.seen) {
            Ok(row) => row,
            Err(StillDuplicate { row }) => match odometer_scan(&row, &self.seen) {
                Some(free) => free,
                None => {
                    tracing::warn!(row = index, "row still duplicate after uniqueness pass");
                    self.notices.push(Notice::StillDuplicate { row: index });
                    row
                }
            },
        };
        self.push_verbatim(accepted);
    }

    fn finish(self, mut leading: Vec<Notice>) -> Generated<DoeGrid> {
        leading.extend(self.notices);
        Generated::with_notices(DoeGrid::new(self.rows), leading)
    }
}

/// Re-check every row against the already-processed rows above it.
pub fn dedup_grid(grid: &DoeGrid) -> Generated<DoeGrid> {
    let mut set = RowSet::with_capacity(grid.doe_count());
    for row in &grid.rows {
        set.push_unique(row.clone());
    }
    set.finish(Vec::new())
}

/// Default `doe × repeat` grid: rotations of a diverse base row, made unique.
pub fn diverse_default_grid(repeat: usize, doe: usize) -> Generated<DoeGrid> {
    let leading: Vec<Notice> = capacity_notice(repeat, doe).into_iter().collect();
    let base = diverse_default_dirs(repeat);
    let mut set = RowSet::with_capacity(doe);
    for r in 0..doe {
        let k = if repeat == 0 { 0 } else { r % repeat };
        set.push_unique(rotate(&base, k));
    }
    set.finish(leading)
}

/// Change the column count. Truncates rows or extends them with the diverse default
/// entries for the added columns, then re-runs [`dedup_grid`].
pub fn resize_repeat(grid: &DoeGrid, new_repeat: usize) -> Generated<DoeGrid> {
    tracing::debug!(
        from = grid.repeat_count(),
        to = new_repeat,
        "resize grid repeat count"
    );
    let defaults = diverse_default_dirs(new_repeat);
    let resized = DoeGrid::new(
        grid.rows
            .iter()
            .map(|row| {
                let mut r: Row = row.iter().take(new_repeat).copied().collect();
                if r.len() < new_repeat {
                    r.extend_from_slice(&defaults[r.len()..]);
                }
                r
            })
            .collect(),
    );
    let mut out = dedup_grid(&resized);
    if let Some(n) = capacity_notice(new_repeat, grid.doe_count()) {
        out.notices.insert(0, n);
    }
    out
}

/// Change the row count. Truncates, or appends rotations of the first row
/// (`rotate(grid[0], (old + i) mod repeat)`) made unique against the growing set.
pub fn resize_doe(grid: &DoeGrid, new_doe: usize, repeat: usize) -> Generated<DoeGrid> {
    tracing::debug!(from = grid.doe_count(), to = new_doe, "resize grid doe count");
    if new_doe <= grid.doe_count() {
        return Generated::clean(DoeGrid::new(grid.rows[..new_doe].to_vec()));
    }
    let leading: Vec<Notice> = capacity_notice(repeat, new_doe).into_iter().collect();
    let base = grid
        .rows
        .first()
        .cloned()
        .unwrap_or_else(|| diverse_default_dirs(repeat));
    let old = grid.doe_count();
    let mut set = RowSet::with_capacity(new_doe);
    for row in &grid.rows {
        set.push_verbatim(row.clone());
    }
    for i in 0..(new_doe - old) {
        let k = if repeat == 0 { 0 } else { (old + i) % repeat };
        set.push_unique(rotate(&base, k));
    }
    set.finish(leading)
}

/// Bring an imported grid to `doe × repeat`, keeping overlapping cells.
pub fn conform_grid(grid: &DoeGrid, repeat: usize, doe: usize) -> Generated<DoeGrid> {
    let rows = resize_repeat(grid, repeat);
    let mut out = resize_doe(&rows.value, doe, repeat);
    let mut notices = rows.notices;
    notices.append(&mut out.notices);
    out.notices = notices;
    out
}

/// Resize a flat repeat sequence, extending with the diverse default entries.
pub fn resize_sequence(seq: &[Direction], repeat: usize) -> Row {
    let defaults = diverse_default_dirs(repeat);
    let mut out: Row = seq.iter().take(repeat).copied().collect();
    if out.len() < repeat {
        out.extend_from_slice(&defaults[out.len()..]);
    }
    out
}
