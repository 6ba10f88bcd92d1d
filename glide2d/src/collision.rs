//! Narrow-phase overlap tests between body footprints.
//!
//! The engines only ever need a boolean answer ("do these two footprints
//! intersect right now?") and its set form ("which of these obstacles does
//! the body intersect?"). Both are pure queries over current positions.

use crate::body::{Body, BodyId, BodyStore};
use crate::math::Vec2;

/// Returns true if the two bodies' footprints currently intersect.
///
/// Footprints that merely touch edge-to-edge do not count as intersecting,
/// so a body resting flush on a platform reads as clear of it.
pub fn overlaps(a: &Body, b: &Body) -> bool {
    polygons_intersect(&a.world_hit_box(), &b.world_hit_box())
}

/// Returns the ids of every obstacle in `set` whose footprint intersects
/// `body`, in set order, without duplicates. Ids missing from the store are
/// skipped.
pub fn overlapping(body: &Body, set: &[BodyId], bodies: &BodyStore) -> Vec<BodyId> {
    let poly = body.world_hit_box();
    set.iter()
        .copied()
        .filter(|&id| {
            bodies
                .get(id)
                .map_or(false, |obstacle| polygons_intersect(&poly, &obstacle.world_hit_box()))
        })
        .collect()
}

/// Separating-axis test for two convex polygons.
fn polygons_intersect(a: &[Vec2], b: &[Vec2]) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    for polygon in [a, b] {
        for i in 0..polygon.len() {
            let p1 = polygon[i];
            let p2 = polygon[(i + 1) % polygon.len()];
            let axis = Vec2::new(p2.y - p1.y, p1.x - p2.x);

            let (min_a, max_a) = project(a, axis);
            let (min_b, max_b) = project(b, axis);
            if max_a <= min_b || max_b <= min_a {
                return false;
            }
        }
    }
    true
}

fn project(points: &[Vec2], axis: Vec2) -> (f32, f32) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for p in points {
        let d = p.dot(axis);
        min = min.min(d);
        max = max.max(d);
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Body {
        Body::new(Vec2::new(x, y), w, h)
    }

    #[test]
    fn overlapping_rects_intersect() {
        assert!(overlaps(&rect(0.0, 0.0, 10.0, 10.0), &rect(8.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn separated_rects_do_not_intersect() {
        assert!(!overlaps(&rect(0.0, 0.0, 10.0, 10.0), &rect(20.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn touching_edges_do_not_count_as_overlap() {
        // Right edge of the first lands exactly on the left edge of the second.
        assert!(!overlaps(&rect(0.0, 0.0, 10.0, 10.0), &rect(10.0, 0.0, 10.0, 10.0)));
        // Same for a shared horizontal edge.
        assert!(!overlaps(&rect(0.0, 0.0, 10.0, 10.0), &rect(0.0, 10.0, 10.0, 10.0)));
    }

    #[test]
    fn rotation_is_part_of_the_footprint() {
        // An axis-aligned 10x10 square at the origin stays clear of a square
        // whose near edge is at x = 7; rotated 45 degrees its corner reaches
        // past 7 and intersects.
        let upright = rect(0.0, 0.0, 10.0, 10.0);
        let tilted = rect(0.0, 0.0, 10.0, 10.0).with_angle(std::f32::consts::FRAC_PI_4);
        let other = rect(12.0, 0.0, 10.0, 10.0);
        assert!(!overlaps(&upright, &other));
        assert!(overlaps(&tilted, &other));
    }

    #[test]
    fn triangle_hypotenuse_separates() {
        let ramp = Body::from_polygon(
            Vec2::new(15.0, 5.0),
            vec![
                Vec2::new(-5.0, -5.0),
                Vec2::new(5.0, -5.0),
                Vec2::new(5.0, 5.0),
            ],
        );
        // Overlaps the ramp's bounding box but sits above the slope.
        let above_slope = rect(12.0, 9.0, 4.0, 4.0);
        assert!(!overlaps(&above_slope, &ramp));
        // Dropped onto the slope it intersects.
        let on_slope = rect(12.0, 2.0, 4.0, 4.0);
        assert!(overlaps(&on_slope, &ramp));
    }

    #[test]
    fn overlapping_preserves_set_order_and_skips_missing() {
        let mut store = BodyStore::new();
        let a = store.spawn(rect(0.0, 0.0, 10.0, 10.0));
        let b = store.spawn(rect(4.0, 0.0, 10.0, 10.0));
        let c = store.spawn(rect(100.0, 0.0, 10.0, 10.0));
        let body = rect(2.0, 0.0, 10.0, 10.0);

        assert_eq!(overlapping(&body, &[b, a, c], &store), vec![b, a]);

        store.remove(a);
        assert_eq!(overlapping(&body, &[b, a, c], &store), vec![b]);
    }
}
