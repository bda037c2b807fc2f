// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Grid-cell snapping for the three trap positioning modes.

use crate::obb::Obb;
use crate::vec2::Vec2;

/// The fixed occupancy-retry order used by "center" and "fixed cell"
/// snapping: the cell itself, then its eight neighbors in the documented
/// order `E, W, S, N, SE, NW, SW, NE`.
const RETRY_OFFSETS: [(i64, i64); 9] = [
    (0, 0),
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
];

/// Returns the `(col, row)` grid cell containing `point`.
#[must_use]
fn cell_of(point: Vec2, grid_size: f64) -> (i64, i64) {
    #[allow(clippy::cast_possible_truncation)]
    let col = (point.x / grid_size).floor() as i64;
    #[allow(clippy::cast_possible_truncation)]
    let row = (point.y / grid_size).floor() as i64;
    (col, row)
}

/// Returns the world-space center of grid cell `(col, row)`.
#[must_use]
fn cell_center(col: i64, row: i64, grid_size: f64) -> Vec2 {
    #[allow(clippy::cast_precision_loss)]
    Vec2::new(
        (col as f64 + 0.5) * grid_size,
        (row as f64 + 0.5) * grid_size,
    )
}

/// Snaps `raw_point` (typically a segment↔OBB intersection) to the cell
/// center that lies inside `obb` and minimizes distance to `raw_point`,
/// searching the 3×3 neighborhood of the cell containing `raw_point`.
///
/// Ties are broken in favor of the candidate with the lexicographically
/// smaller `(row, col)`. If no candidate in the neighborhood lies inside the
/// OBB, falls back to the naive floor-snap of `raw_point`.
#[must_use]
pub fn snap_intersection(obb: &Obb, raw_point: Vec2, grid_size: f64) -> Vec2 {
    let (col0, row0) = cell_of(raw_point, grid_size);

    let mut best: Option<((i64, i64), f64, Vec2)> = None;
    for row in (row0 - 1)..=(row0 + 1) {
        for col in (col0 - 1)..=(col0 + 1) {
            let center = cell_center(col, row, grid_size);
            if !obb.contains_point(center) {
                continue;
            }
            let dist = center.distance(&raw_point);
            let key = (row, col);
            let replace = match &best {
                None => true,
                Some((best_key, best_dist, _)) => {
                    dist < *best_dist || ((dist - *best_dist).abs() < f64::EPSILON && key < *best_key)
                }
            };
            if replace {
                best = Some((key, dist, center));
            }
        }
    }

    match best {
        Some((_, _, center)) => center,
        None => cell_center(col0, row0, grid_size),
    }
}

/// Snaps to the cell nearest `obb`'s center, retrying the fixed 9-position
/// occupancy order (self, E, W, S, N, SE, NW, SW, NE) while `is_occupied`
/// returns `true`.
///
/// If every candidate in the retry order is occupied, returns the center
/// cell itself (the caller is expected to handle the resulting collision).
#[must_use]
pub fn snap_center(obb: &Obb, grid_size: f64, is_occupied: impl Fn(Vec2) -> bool) -> Vec2 {
    let (col0, row0) = cell_of(obb.center(), grid_size);
    retry_occupancy(col0, row0, grid_size, is_occupied)
}

/// Snaps to a fixed `(cell_x, cell_y)` offset within `obb`'s own cell grid,
/// clamped to the trap's cell extents, then retries occupancy as in
/// [`snap_center`].
#[must_use]
pub fn snap_fixed_cell(
    obb: &Obb,
    grid_size: f64,
    cell_x: i32,
    cell_y: i32,
    is_occupied: impl Fn(Vec2) -> bool,
) -> Vec2 {
    let corners = obb.corners();
    let min_x = corners.iter().map(|c| c.x).fold(f64::INFINITY, f64::min);
    let min_y = corners.iter().map(|c| c.y).fold(f64::INFINITY, f64::min);
    let (base_col, base_row) = cell_of(Vec2::new(min_x, min_y), grid_size);

    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    let cols_extent = ((obb.width() / grid_size).floor() as i64).max(1);
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    let rows_extent = ((obb.height() / grid_size).floor() as i64).max(1);

    let clamped_x = i64::from(cell_x).clamp(0, cols_extent - 1);
    let clamped_y = i64::from(cell_y).clamp(0, rows_extent - 1);

    let target_col = base_col + clamped_x;
    let target_row = base_row + clamped_y;
    retry_occupancy(target_col, target_row, grid_size, is_occupied)
}

/// Walks [`RETRY_OFFSETS`] from `(col0, row0)`, returning the first
/// unoccupied cell center, or the center cell if none qualify.
fn retry_occupancy(col0: i64, row0: i64, grid_size: f64, is_occupied: impl Fn(Vec2) -> bool) -> Vec2 {
    let mut fallback = cell_center(col0, row0, grid_size);
    for (i, (dc, dr)) in RETRY_OFFSETS.iter().enumerate() {
        let center = cell_center(col0 + dc, row0 + dr, grid_size);
        if i == 0 {
            fallback = center;
        }
        if !is_occupied(center) {
            return center;
        }
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersection_snap_picks_cell_inside_obb() {
        let obb = Obb::new(Vec2::new(700.0, 700.0), 70.0, 70.0, 0.0);
        let snapped = snap_intersection(&obb, Vec2::new(665.0, 700.0), 70.0);
        // (665,665) and (665,735) tie at distance 35; lower (row,col) wins.
        assert_eq!(snapped, Vec2::new(665.0, 665.0));
    }

    #[test]
    fn intersection_snap_rotated_box_lies_inside() {
        let obb = Obb::new(Vec2::new(700.0, 700.0), 70.0, 70.0, 37.0);
        let snapped = snap_intersection(&obb, Vec2::new(700.0, 700.0), 70.0);
        assert!(obb.contains_point(snapped));
    }

    #[test]
    fn center_snap_retries_when_occupied() {
        let obb = Obb::new(Vec2::new(700.0, 700.0), 70.0, 70.0, 0.0);
        let occupied_center = cell_center(10, 10, 70.0);
        let snapped = snap_center(&obb, 70.0, |p| p == occupied_center);
        assert_ne!(snapped, occupied_center);
    }

    #[test]
    fn fixed_cell_is_clamped_to_extents() {
        let obb = Obb::new(Vec2::new(700.0, 700.0), 70.0, 70.0, 0.0);
        // A 1x1 cell trap only has cell (0,0); requesting (5,5) clamps to (0,0).
        let snapped = snap_fixed_cell(&obb, 70.0, 5, 5, |_| false);
        assert_eq!(snapped, Vec2::new(700.0, 700.0));
    }
}
