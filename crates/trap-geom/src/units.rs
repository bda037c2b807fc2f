// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pixel↔map-unit conversions.
//!
//! A page carries a `grid_size` (pixels per cell) and a `scale` (map units
//! per cell, e.g. 5 feet per cell). All geometry in this crate works in
//! pixels; callers convert to map units only when reporting distances.

/// Converts a pixel distance to map units given the page's `grid_size` and
/// `scale`.
#[must_use]
pub fn pixels_to_map_units(pixels: f64, grid_size: f64, scale: f64) -> f64 {
    if grid_size <= 0.0 {
        return 0.0;
    }
    pixels * scale / grid_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_one_cell_to_scale_units() {
        assert!((pixels_to_map_units(70.0, 70.0, 5.0) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn zero_grid_size_is_handled_without_panicking() {
        assert_eq!(pixels_to_map_units(100.0, 0.0, 5.0), 0.0);
    }
}
