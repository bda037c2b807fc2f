// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

use crate::vec2::Vec2;

/// An oriented bounding box: a rectangle with a center, full width/height
/// (in pixels), and a rotation in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Obb {
    center: Vec2,
    width: f64,
    height: f64,
    rotation_deg: f64,
}

/// The four corners of an [`Obb`], in `TL, TR, BR, BL` order.
pub type Corners = [Vec2; 4];

impl Obb {
    /// Builds an OBB from its center, full width/height, and rotation in degrees.
    #[must_use]
    pub const fn new(center: Vec2, width: f64, height: f64, rotation_deg: f64) -> Self {
        Self {
            center,
            width,
            height,
            rotation_deg,
        }
    }

    /// The box's center, in pixels.
    #[must_use]
    pub const fn center(&self) -> Vec2 {
        self.center
    }

    /// The box's full width, in pixels.
    #[must_use]
    pub const fn width(&self) -> f64 {
        self.width
    }

    /// The box's full height, in pixels.
    #[must_use]
    pub const fn height(&self) -> f64 {
        self.height
    }

    /// The box's rotation, in degrees.
    #[must_use]
    pub const fn rotation_deg(&self) -> f64 {
        self.rotation_deg
    }

    /// The four corners of the box, `TL, TR, BR, BL`, after rotation.
    ///
    /// Rotation is applied to the four unrotated local corners around the
    /// center; screen-space convention is y-down.
    #[must_use]
    pub fn corners(&self) -> Corners {
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        let local = [
            Vec2::new(-hw, -hh), // TL
            Vec2::new(hw, -hh),  // TR
            Vec2::new(hw, hh),   // BR
            Vec2::new(-hw, hh),  // BL
        ];
        local.map(|corner| corner.rotate_deg(self.rotation_deg).add(&self.center))
    }

    /// Tests whether `point` lies inside this box (inclusive of the boundary).
    ///
    /// Implemented by projecting `point - TL` onto the two edge vectors from
    /// `TL`; the point is inside iff both projections lie within their
    /// respective edge lengths.
    #[must_use]
    pub fn contains_point(&self, point: Vec2) -> bool {
        let [tl, tr, _br, bl] = self.corners();
        let edge1 = tr.sub(&tl); // TL -> TR
        let edge2 = bl.sub(&tl); // TL -> BL
        let rel = point.sub(&tl);

        let len1_sq = edge1.dot(&edge1);
        let len2_sq = edge2.dot(&edge2);
        if len1_sq <= f64::EPSILON || len2_sq <= f64::EPSILON {
            return false;
        }

        let t1 = rel.dot(&edge1) / len1_sq;
        let t2 = rel.dot(&edge2) / len2_sq;
        (0.0..=1.0).contains(&t1) && (0.0..=1.0).contains(&t2)
    }

    /// Intersects the moving segment `prev -> curr` against this box's four
    /// edges, returning the intersection point nearest `prev`, or `None` if
    /// the segment does not cross any edge.
    ///
    /// Per the micro-jitter suppression rule, if the straight-line distance
    /// of the move is below `min_movement_fraction * grid_size`, this always
    /// returns `None`.
    #[must_use]
    pub fn segment_intersect(
        &self,
        prev: Vec2,
        curr: Vec2,
        grid_size: f64,
        min_movement_fraction: f64,
    ) -> Option<Vec2> {
        if prev.distance(&curr) < min_movement_fraction * grid_size {
            return None;
        }

        let corners = self.corners();
        let mut best: Option<(f64, Vec2)> = None;
        for i in 0..4 {
            let a = corners[i];
            let b = corners[(i + 1) % 4];
            if let Some((t, point)) = segment_segment_intersect(prev, curr, a, b) {
                if best.is_none_or(|(best_t, _)| t < best_t) {
                    best = Some((t, point));
                }
            }
        }
        best.map(|(_, point)| point)
    }
}

/// Whether segment `p1 -> p2` crosses segment `p3 -> p4`, endpoints
/// inclusive. Used outside this crate for line-of-sight blocking tests
/// against wall/door segments.
#[must_use]
pub fn segments_intersect(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> bool {
    segment_segment_intersect(p1, p2, p3, p4).is_some()
}

/// Intersects segment `p1 -> p2` against segment `p3 -> p4`.
///
/// Returns the intersection point and the parametric position `t` along
/// `p1 -> p2` (used by the caller to find the intersection nearest the
/// segment's start).
fn segment_segment_intersect(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> Option<(f64, Vec2)> {
    let d1 = p2.sub(&p1);
    let d2 = p4.sub(&p3);
    let denom = d1.x * d2.y - d1.y * d2.x;
    if denom.abs() <= f64::EPSILON {
        return None; // parallel or degenerate
    }

    let diff = p3.sub(&p1);
    let t = (diff.x * d2.y - diff.y * d2.x) / denom;
    let u = (diff.x * d1.y - diff.y * d1.x) / denom;

    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some((t, p1.add(&d1.scale(t))))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_aligned_corners_order() {
        let obb = Obb::new(Vec2::new(100.0, 100.0), 20.0, 10.0, 0.0);
        let [tl, tr, br, bl] = obb.corners();
        assert_eq!(tl, Vec2::new(90.0, 95.0));
        assert_eq!(tr, Vec2::new(110.0, 95.0));
        assert_eq!(br, Vec2::new(110.0, 105.0));
        assert_eq!(bl, Vec2::new(90.0, 105.0));
    }

    #[test]
    fn point_inside_axis_aligned_box() {
        let obb = Obb::new(Vec2::new(0.0, 0.0), 100.0, 100.0, 0.0);
        assert!(obb.contains_point(Vec2::new(0.0, 0.0)));
        assert!(obb.contains_point(Vec2::new(49.0, -49.0)));
        assert!(!obb.contains_point(Vec2::new(51.0, 0.0)));
    }

    #[test]
    fn rotated_box_contains_rotated_point() {
        // A 37-degree rotated box still considers its own rotated corner
        // region as "inside" near the center.
        let obb = Obb::new(Vec2::new(50.0, 50.0), 70.0, 70.0, 37.0);
        assert!(obb.contains_point(Vec2::new(50.0, 50.0)));
    }

    #[test]
    fn segment_crossing_box_is_detected() {
        let obb = Obb::new(Vec2::new(700.0, 700.0), 70.0, 70.0, 0.0);
        let hit = obb.segment_intersect(Vec2::new(630.0, 700.0), Vec2::new(770.0, 700.0), 70.0, 0.3);
        assert!(hit.is_some());
    }

    #[test]
    fn micro_move_below_threshold_never_triggers() {
        let obb = Obb::new(Vec2::new(700.0, 700.0), 70.0, 70.0, 0.0);
        // Move of only 5px with grid_size 70 and fraction 0.3 (threshold 21px).
        let hit = obb.segment_intersect(Vec2::new(696.0, 700.0), Vec2::new(701.0, 700.0), 70.0, 0.3);
        assert!(hit.is_none());
    }

    #[test]
    fn segment_missing_box_returns_none() {
        let obb = Obb::new(Vec2::new(700.0, 700.0), 70.0, 70.0, 0.0);
        let hit = obb.segment_intersect(Vec2::new(0.0, 0.0), Vec2::new(50.0, 50.0), 70.0, 0.3);
        assert!(hit.is_none());
    }
}
