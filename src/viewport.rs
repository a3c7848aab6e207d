//! Virtual windowing: computes the minimal set of rows and center
//! columns to materialize for the current scroll position, plus the
//! leading/trailing padding that keeps the scrollable extent correct.
//!
//! Pure geometry. Pinned columns are outside the virtualized center
//! region and always materialized; the host lays them out using the
//! pinned widths from the view.

use serde::{Deserialize, Serialize};

/// A half-open index range `[start, end)` of rows to materialize,
/// with pixel padding standing in for everything scrolled out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowWindow {
    pub start: usize,
    pub end: usize,
    pub lead_px: u64,
    pub trail_px: u64,
}

impl RowWindow {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A half-open index range of center columns to materialize, with
/// pixel padding on either side inside the scrollable center region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnWindow {
    pub start: usize,
    pub end: usize,
    pub lead_px: u64,
    pub trail_px: u64,
}

impl ColumnWindow {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Rows intersecting the viewport at `scroll_top`, widened by
/// `overscan` rows on each side to avoid flicker during fast scroll.
///
/// `row_height` is the estimated uniform row height; a zero height is
/// treated as one pixel rather than dividing by zero.
pub fn row_window(
    total_rows: usize,
    row_height: u32,
    scroll_top: u64,
    viewport_height: u32,
    overscan: usize,
) -> RowWindow {
    if total_rows == 0 {
        return RowWindow {
            start: 0,
            end: 0,
            lead_px: 0,
            trail_px: 0,
        };
    }
    let row_height = row_height.max(1) as u64;

    let first_visible = (scroll_top / row_height) as usize;
    let last_visible = ((scroll_top + viewport_height as u64) / row_height) as usize;

    let start = first_visible.saturating_sub(overscan).min(total_rows);
    let end = (last_visible + 1 + overscan).min(total_rows);
    let end = end.max(start);

    RowWindow {
        start,
        end,
        lead_px: start as u64 * row_height,
        trail_px: (total_rows - end) as u64 * row_height,
    }
}

/// Center columns intersecting the horizontal viewport at
/// `scroll_left`, widened by `overscan` columns on each side.
///
/// `widths` are the pixel widths of the center (non-pinned) columns in
/// order; `scroll_left` and `viewport_width` describe the scrollable
/// center region only, after the host subtracts the pinned widths.
pub fn column_window(
    widths: &[u32],
    scroll_left: u64,
    viewport_width: u32,
    overscan: usize,
) -> ColumnWindow {
    if widths.is_empty() {
        return ColumnWindow {
            start: 0,
            end: 0,
            lead_px: 0,
            trail_px: 0,
        };
    }

    let total: u64 = widths.iter().map(|&w| w as u64).sum();
    let right_edge = scroll_left + viewport_width as u64;

    // First column whose right edge is past the scroll offset
    let mut x: u64 = 0;
    let mut first = widths.len();
    for (idx, &w) in widths.iter().enumerate() {
        x += w as u64;
        if x > scroll_left {
            first = idx;
            break;
        }
    }

    // Last column whose left edge is inside the viewport, continuing
    // from `first` (x currently holds first's right edge)
    let mut last = first;
    if first < widths.len() {
        let mut left_edge = x - widths[first] as u64;
        for (idx, &w) in widths.iter().enumerate().skip(first) {
            if left_edge < right_edge {
                last = idx;
            } else {
                break;
            }
            left_edge += w as u64;
        }
    }

    let start = first.saturating_sub(overscan);
    let end = (last + 1 + overscan).min(widths.len());
    let end = end.max(start);

    let lead_px: u64 = widths[..start].iter().map(|&w| w as u64).sum();
    let shown: u64 = widths[start..end].iter().map(|&w| w as u64).sum();

    ColumnWindow {
        start,
        end,
        lead_px,
        trail_px: total - lead_px - shown,
    }
}
