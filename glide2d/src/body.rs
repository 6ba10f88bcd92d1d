//! Bodies and the store that owns them.
//!
//! A [`Body`] is any positioned, shaped entity the engines can move or test
//! against: the controlled character, a wall tile, a patrolling platform, a
//! ladder. Bodies live in a [`BodyStore`] owned by the game; the engines only
//! keep [`BodyId`] handles and borrow the store per call.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::math::Vec2;

/// Unique identifier for a body in a [`BodyStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyId(u32);

impl BodyId {
    /// Get the underlying integer ID (useful for debugging or serialization).
    pub fn to_u32(self) -> u32 {
        self.0
    }
}

/// A moving or static entity with a convex polygon footprint.
///
/// `position` is the center of the footprint; the hit box is stored as local
/// points around it. `velocity` is the per-tick position delta the engines
/// apply and correct. Patrol boundaries are only consulted for kinematic
/// platforms driven by [`PlatformerEngine`](crate::physics::PlatformerEngine).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Rotation in radians, counter-clockwise.
    pub angle: f32,
    /// Rotation applied per update, in radians.
    pub angular_velocity: f32,
    hit_box: Vec<Vec2>,
    pub boundary_left: Option<f32>,
    pub boundary_right: Option<f32>,
    pub boundary_top: Option<f32>,
    pub boundary_bottom: Option<f32>,
}

impl Body {
    /// Create a body with an axis-aligned rectangular footprint.
    pub fn new(position: Vec2, width: f32, height: f32) -> Self {
        let hx = width / 2.0;
        let hy = height / 2.0;
        Self::from_polygon(
            position,
            vec![
                Vec2::new(-hx, -hy),
                Vec2::new(hx, -hy),
                Vec2::new(hx, hy),
                Vec2::new(-hx, hy),
            ],
        )
    }

    /// Create a body from a convex polygon, given as points relative to
    /// `position`. Needed for non-rectangular footprints such as ramps.
    pub fn from_polygon(position: Vec2, points: Vec<Vec2>) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            angle: 0.0,
            angular_velocity: 0.0,
            hit_box: points,
            boundary_left: None,
            boundary_right: None,
            boundary_top: None,
            boundary_bottom: None,
        }
    }

    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    #[must_use]
    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    #[must_use]
    pub fn with_angular_velocity(mut self, angular_velocity: f32) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    /// The local hit-box polygon, relative to `position` and unrotated.
    pub fn hit_box(&self) -> &[Vec2] {
        &self.hit_box
    }

    /// The hit-box polygon in world space, rotated and translated.
    pub fn world_hit_box(&self) -> Vec<Vec2> {
        if self.angle == 0.0 {
            self.hit_box.iter().map(|&p| self.position + p).collect()
        } else {
            self.hit_box
                .iter()
                .map(|&p| self.position + p.rotated(self.angle))
                .collect()
        }
    }

    /// World x-coordinate of the leftmost point of the footprint.
    pub fn left(&self) -> f32 {
        self.world_hit_box()
            .iter()
            .fold(f32::INFINITY, |m, p| m.min(p.x))
    }

    /// World x-coordinate of the rightmost point of the footprint.
    pub fn right(&self) -> f32 {
        self.world_hit_box()
            .iter()
            .fold(f32::NEG_INFINITY, |m, p| m.max(p.x))
    }

    /// World y-coordinate of the highest point of the footprint.
    pub fn top(&self) -> f32 {
        self.world_hit_box()
            .iter()
            .fold(f32::NEG_INFINITY, |m, p| m.max(p.y))
    }

    /// World y-coordinate of the lowest point of the footprint.
    pub fn bottom(&self) -> f32 {
        self.world_hit_box()
            .iter()
            .fold(f32::INFINITY, |m, p| m.min(p.y))
    }

    /// Translate the body so its left edge lands on `x`.
    pub fn set_left(&mut self, x: f32) {
        self.position.x += x - self.left();
    }

    /// Translate the body so its right edge lands on `x`.
    pub fn set_right(&mut self, x: f32) {
        self.position.x += x - self.right();
    }

    /// Translate the body so its top edge lands on `y`.
    pub fn set_top(&mut self, y: f32) {
        self.position.y += y - self.top();
    }

    /// Translate the body so its bottom edge lands on `y`.
    pub fn set_bottom(&mut self, y: f32) {
        self.position.y += y - self.bottom();
    }
}

/// Caller-owned body storage with stable id handles.
///
/// Engines never own bodies: they keep ids into a store the game owns and
/// passes in by exclusive reference for each call, so a full update pass has
/// sole access to every position it may touch.
pub struct BodyStore {
    next_id: u32,
    bodies: HashMap<BodyId, Body>,
}

impl BodyStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            bodies: HashMap::new(),
        }
    }

    /// Add a body and return its id. Ids are never reused.
    pub fn spawn(&mut self, body: Body) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.bodies.insert(id, body);
        id
    }

    /// Remove and return a body. Engines still holding the id will skip it
    /// (obstacles) or report an error (the controlled body).
    pub fn remove(&mut self, id: BodyId) -> Option<Body> {
        self.bodies.remove(&id)
    }

    /// Re-insert a body under the id it was removed with.
    pub(crate) fn put_back(&mut self, id: BodyId, body: Body) {
        self.bodies.insert(id, body);
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains_key(&id)
    }

    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(&id)
    }

    /// Number of bodies in the store.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Returns true if the store holds no bodies.
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

impl Default for BodyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_edges_follow_position() {
        let body = Body::new(Vec2::new(10.0, 20.0), 4.0, 6.0);
        assert_eq!(body.left(), 8.0);
        assert_eq!(body.right(), 12.0);
        assert_eq!(body.bottom(), 17.0);
        assert_eq!(body.top(), 23.0);
    }

    #[test]
    fn edge_setters_translate_the_center() {
        let mut body = Body::new(Vec2::new(0.0, 0.0), 10.0, 10.0);
        body.set_left(20.0);
        assert_eq!(body.position.x, 25.0);
        assert_eq!(body.left(), 20.0);

        body.set_bottom(-5.0);
        assert_eq!(body.position.y, 0.0);
        assert_eq!(body.bottom(), -5.0);

        body.set_right(0.0);
        assert_eq!(body.right(), 0.0);
        body.set_top(0.0);
        assert_eq!(body.top(), 0.0);
    }

    #[test]
    fn rotation_widens_a_square_footprint() {
        let body = Body::new(Vec2::ZERO, 2.0, 2.0).with_angle(std::f32::consts::FRAC_PI_4);
        let half_diagonal = 2.0_f32.sqrt();
        assert!((body.right() - half_diagonal).abs() < 1e-5);
        assert!((body.left() + half_diagonal).abs() < 1e-5);
    }

    #[test]
    fn polygon_edges_use_the_actual_points() {
        let ramp = Body::from_polygon(
            Vec2::new(15.0, 5.0),
            vec![
                Vec2::new(-5.0, -5.0),
                Vec2::new(5.0, -5.0),
                Vec2::new(5.0, 5.0),
            ],
        );
        assert_eq!(ramp.left(), 10.0);
        assert_eq!(ramp.right(), 20.0);
        assert_eq!(ramp.bottom(), 0.0);
        assert_eq!(ramp.top(), 10.0);
    }

    #[test]
    fn store_spawn_get_remove() {
        let mut store = BodyStore::new();
        assert!(store.is_empty());

        let id = store.spawn(Body::new(Vec2::ZERO, 1.0, 1.0));
        assert!(store.contains(id));
        assert_eq!(store.len(), 1);

        store.get_mut(id).unwrap().position.x = 7.0;
        assert_eq!(store.get(id).unwrap().position.x, 7.0);

        assert!(store.remove(id).is_some());
        assert!(!store.contains(id));
        assert!(store.remove(id).is_none());
    }

    #[test]
    fn store_ids_are_not_reused() {
        let mut store = BodyStore::new();
        let a = store.spawn(Body::new(Vec2::ZERO, 1.0, 1.0));
        store.remove(a);
        let b = store.spawn(Body::new(Vec2::ZERO, 1.0, 1.0));
        assert_ne!(a, b);
    }
}
