//! Geometric predicates for 3D collision detection and rotation handling.
//!
//! These are the only primitives the placement engine uses to decide whether a
//! position is valid: containment in the usable container box, pairwise
//! overlap between placed items, and the set of orientations an item may take.

use crate::model::PlacedItem;
use crate::types::{BoundingBox, Vec3};

/// Index permutations of (width, depth, height), identity first.
///
/// The order is fixed so that orientation search stays deterministic.
const PERMUTATIONS: [(usize, usize, usize); 6] = [
    (0, 1, 2),
    (1, 0, 2),
    (0, 2, 1),
    (2, 0, 1),
    (1, 2, 0),
    (2, 1, 0),
];

/// Enumerates the distinct orientations of a box.
///
/// With rotation disabled only the authored orientation is returned.
/// Equal side lengths produce identical permutations; those are collapsed.
///
/// # Example
/// ```
/// use load_planner::geometry::orientations;
/// use load_planner::types::Vec3;
///
/// let dims = Vec3::new(90.0, 190.0, 28.0);
/// assert_eq!(orientations(dims, false).len(), 1);
/// assert_eq!(orientations(dims, true).len(), 6);
/// assert_eq!(orientations(Vec3::new(10.0, 10.0, 10.0), true).len(), 1);
/// ```
pub fn orientations(dims: Vec3, allow_rotation: bool) -> Vec<Vec3> {
    if !allow_rotation {
        return vec![dims];
    }

    let axes = [dims.x, dims.y, dims.z];
    let mut result: Vec<Vec3> = Vec::with_capacity(PERMUTATIONS.len());
    for (a, b, c) in PERMUTATIONS {
        let candidate = Vec3::new(axes[a], axes[b], axes[c]);
        if !result.iter().any(|existing| *existing == candidate) {
            result.push(candidate);
        }
    }
    result
}

/// Checks whether a box at `position` lies entirely within `bounds`.
///
/// `bounds` are the usable container dimensions, anchored at the origin.
pub fn fits_in_container(position: Vec3, dims: Vec3, bounds: Vec3, epsilon: f64) -> bool {
    position.x >= -epsilon
        && position.y >= -epsilon
        && position.z >= -epsilon
        && (position + dims).fits_within(&bounds, epsilon)
}

/// Checks whether two placed items share volume.
///
/// Uses Axis-Aligned Bounding Box (AABB) collision detection: two items do
/// NOT overlap if they are separated along at least one axis. Flush contact
/// is not an overlap.
pub fn intersects(a: &PlacedItem, b: &PlacedItem, epsilon: f64) -> bool {
    a.bounding_box().intersects(&b.bounding_box(), epsilon)
}

/// Overlap area between the footprints of two boxes in the XY plane.
pub fn footprint_overlap(a: &BoundingBox, b: &BoundingBox) -> f64 {
    a.overlap_area_xy(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CargoItem;
    use crate::types::EPSILON_GENERAL;

    fn placed(dims: (f64, f64, f64), position: (f64, f64, f64)) -> PlacedItem {
        let item = CargoItem::new("g_0|base|0", "g_0", "Set", "base", dims, 10.0, 100.0).unwrap();
        PlacedItem::new(item, Vec3::from_tuple(position), Vec3::from_tuple(dims))
    }

    #[test]
    fn rotation_disabled_keeps_identity_only() {
        let dims = Vec3::new(90.0, 100.0, 10.0);
        assert_eq!(orientations(dims, false), vec![dims]);
    }

    #[test]
    fn rotation_enabled_starts_with_identity_and_is_distinct() {
        let dims = Vec3::new(90.0, 100.0, 10.0);
        let all = orientations(dims, true);
        assert_eq!(all[0], dims);
        assert_eq!(all.len(), 6);
        for (i, a) in all.iter().enumerate() {
            for b in all.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
            assert!((a.volume() - dims.volume()).abs() < EPSILON_GENERAL);
        }
    }

    #[test]
    fn two_equal_sides_yield_three_orientations() {
        let all = orientations(Vec3::new(90.0, 90.0, 25.0), true);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn containment_respects_all_walls() {
        let bounds = Vec3::new(245.0, 1330.0, 270.0);
        let dims = Vec3::new(90.0, 190.0, 28.0);

        assert!(fits_in_container(Vec3::zero(), dims, bounds, EPSILON_GENERAL));
        assert!(fits_in_container(
            Vec3::new(155.0, 1140.0, 242.0),
            dims,
            bounds,
            EPSILON_GENERAL
        ));
        assert!(!fits_in_container(
            Vec3::new(156.0, 0.0, 0.0),
            dims,
            bounds,
            EPSILON_GENERAL
        ));
        assert!(!fits_in_container(
            Vec3::new(0.0, 0.0, 243.0),
            dims,
            bounds,
            EPSILON_GENERAL
        ));
        assert!(!fits_in_container(
            Vec3::new(-1.0, 0.0, 0.0),
            dims,
            bounds,
            EPSILON_GENERAL
        ));
    }

    #[test]
    fn flush_items_do_not_intersect() {
        let a = placed((10.0, 10.0, 10.0), (0.0, 0.0, 0.0));
        let b = placed((10.0, 10.0, 10.0), (10.0, 0.0, 0.0));
        let c = placed((10.0, 10.0, 10.0), (0.0, 0.0, 10.0));
        let d = placed((10.0, 10.0, 10.0), (9.0, 9.0, 9.0));

        assert!(!intersects(&a, &b, EPSILON_GENERAL));
        assert!(!intersects(&a, &c, EPSILON_GENERAL));
        assert!(intersects(&a, &d, EPSILON_GENERAL));
    }

    #[test]
    fn footprint_overlap_ignores_height() {
        let a = placed((10.0, 10.0, 10.0), (0.0, 0.0, 0.0));
        let b = placed((10.0, 10.0, 10.0), (5.0, 0.0, 10.0));
        let overlap = footprint_overlap(&a.bounding_box(), &b.bounding_box());
        assert!((overlap - 50.0).abs() < EPSILON_GENERAL);
    }
}
