// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![deny(
    warnings,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    rust_2018_idioms,
    missing_docs,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]
#![doc = r"Oriented-bounding-box geometry for the trap engine.

This crate provides:
- A 2D vector type (`Vec2`) in pixel space.
- Oriented bounding boxes (`Obb`) with rotation, corner computation, segment
  intersection, and point containment.
- Grid snapping for the three trap positioning modes (intersection, center,
  fixed cell), including the occupancy-retry walk.
- Pixel↔map-unit conversion.

Design notes:
- `f64` throughout: this is 2D virtual-tabletop geometry (pixel coordinates
  on a flat page), not 3D world space, so there is no need for the teacher's
  `f32`/`Mat4` machinery.
- No host dependency: every function here is pure, deterministic math.
"]

/// 2D vector and point arithmetic.
pub mod vec2;
/// Oriented bounding box: corners, segment intersection, point containment.
pub mod obb;
/// Grid-cell snapping for the three trap positioning modes.
pub mod snap;
/// Pixel↔map-unit conversions.
pub mod units;

pub use obb::{segments_intersect, Obb};
pub use vec2::Vec2;
