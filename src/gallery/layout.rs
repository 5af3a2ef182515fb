//! Gallery layout computation
//!
//! Two strategies share the same item state:
//! - balanced columns: the ordered sequence is split into contiguous runs,
//!   one run per column
//! - justified rows: items are accumulated until the row overflows the
//!   container, then the row is rescaled to fill the width exactly
//!
//! `compute` is a pure function of its inputs. Applying the result to the
//! placeholders is the `Surface`'s job.

use serde::{Deserialize, Serialize};

/// Spacing between tiles, matches the theme gutter
pub const GUTTER: f32 = 12.0;

/// Which strategy places the tiles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Balanced columns
    #[default]
    Vertical,
    /// Justified rows
    Horizontal,
}

impl LayoutMode {
    pub fn toggled(self) -> Self {
        match self {
            LayoutMode::Vertical => LayoutMode::Horizontal,
            LayoutMode::Horizontal => LayoutMode::Vertical,
        }
    }
}

/// Tunables for both strategies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub gutter: f32,
    pub min_col_width: f32,
    pub target_row_height: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            gutter: GUTTER,
            min_col_width: 200.0,
            target_row_height: 320.0,
        }
    }
}

/// Axis-aligned rectangle in content coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Grow the rectangle by `margin` on every side
    pub fn expand(&self, margin: f32) -> Self {
        Self {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + margin * 2.0,
            height: self.height + margin * 2.0,
        }
    }

    /// Edges touching counts as intersecting so zero-sized tiles are still seen
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }
}

/// Placement of one item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    /// Column index (vertical) or row index (horizontal)
    pub lane: usize,
    pub rect: Rect,
}

/// Result of a layout pass, one cell per input item in input order
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub mode: LayoutMode,
    /// Number of columns (vertical) or rows (horizontal)
    pub lanes: usize,
    pub cells: Vec<Cell>,
    pub content_height: f32,
}

/// Number of columns that fit in the container
pub fn column_count(container_width: f32, params: &LayoutParams) -> usize {
    let per_column = params.min_col_width + params.gutter;
    if per_column <= 0.0 {
        return 1;
    }
    // N * min + (N - 1) * gutter <= width
    let count = ((container_width + params.gutter) / per_column).floor();
    if count.is_finite() && count >= 1.0 {
        count as usize
    } else {
        1
    }
}

/// Compute placement for `ratios` (one optional aspect ratio per item)
///
/// Returns `None` for an empty input or a container without width, leaving any
/// existing layout untouched.
pub fn compute(
    ratios: &[Option<f32>],
    container_width: f32,
    mode: LayoutMode,
    params: &LayoutParams,
) -> Option<Placement> {
    if ratios.is_empty() || !(container_width > 0.0) || !container_width.is_finite() {
        return None;
    }

    Some(match mode {
        LayoutMode::Vertical => balanced_columns(ratios, container_width, params),
        LayoutMode::Horizontal => justified_rows(ratios, container_width, params),
    })
}

/// Unknown or malformed ratios render square until metadata arrives
fn effective_ratio(ratio: Option<f32>) -> f32 {
    ratio.filter(|r| r.is_finite() && *r > 0.0).unwrap_or(1.0)
}

fn balanced_columns(ratios: &[Option<f32>], container_width: f32, params: &LayoutParams) -> Placement {
    let gutter = params.gutter;
    let count = column_count(container_width, params);
    let per_column = ratios.len().div_ceil(count);
    let col_width = ((container_width - gutter * (count - 1) as f32) / count as f32).max(0.0);

    let mut column_heights = vec![0.0f32; count];
    let cells = ratios
        .iter()
        .enumerate()
        .map(|(i, ratio)| {
            let column = (i / per_column).min(count - 1);
            let height = col_width / effective_ratio(*ratio);
            let rect = Rect::new(
                column as f32 * (col_width + gutter),
                column_heights[column],
                col_width,
                height,
            );
            column_heights[column] += height + gutter;
            Cell { lane: column, rect }
        })
        .collect();

    let tallest = column_heights.iter().cloned().fold(0.0f32, f32::max);

    Placement {
        mode: LayoutMode::Vertical,
        lanes: count,
        cells,
        content_height: (tallest - gutter).max(0.0),
    }
}

fn justified_rows(ratios: &[Option<f32>], container_width: f32, params: &LayoutParams) -> Placement {
    let gutter = params.gutter;
    let target = params.target_row_height;

    let mut cells = Vec::with_capacity(ratios.len());
    let mut row: Vec<f32> = Vec::new();
    let mut row_width = 0.0f32;
    let mut y = 0.0f32;
    let mut lane = 0;

    for ratio in ratios {
        let ratio = effective_ratio(*ratio);
        row.push(ratio);
        row_width += target * ratio;

        // The item that overflows the row is part of it
        let gutters = (row.len() - 1) as f32 * gutter;
        if row_width + gutters > container_width {
            let sum: f32 = row.iter().sum();
            let height = ((container_width - gutters) / sum).max(0.0);
            place_row(&mut cells, &row, lane, y, height, gutter);

            y += height + gutter;
            lane += 1;
            row.clear();
            row_width = 0.0;
        }
    }

    // Last row keeps the target height instead of stretching
    if !row.is_empty() {
        place_row(&mut cells, &row, lane, y, target, gutter);
        y += target + gutter;
        lane += 1;
    }

    Placement {
        mode: LayoutMode::Horizontal,
        lanes: lane,
        cells,
        content_height: (y - gutter).max(0.0),
    }
}

fn place_row(cells: &mut Vec<Cell>, row: &[f32], lane: usize, y: f32, height: f32, gutter: f32) {
    let mut x = 0.0;
    for ratio in row {
        let width = height * ratio;
        cells.push(Cell {
            lane,
            rect: Rect::new(x, y, width, height),
        });
        x += width + gutter;
    }
}
