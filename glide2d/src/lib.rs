//! Glide2D - positional collision resolution for 2D sprite games.
//!
//! Two engines sit on top of one shared movement resolver: [`SimpleEngine`]
//! for top-down games without gravity, and [`PlatformerEngine`] for gravity,
//! jump bookkeeping, ramp climbing, and moving platforms. Bodies live in a
//! caller-owned [`BodyStore`]; the engines hold ids and borrow the store for
//! the duration of each call.

pub mod body;
pub mod collision;
pub mod math;
pub mod physics;

pub use crate::body::{Body, BodyId, BodyStore};
pub use crate::collision::{overlapping, overlaps};
pub use crate::math::Vec2;
pub use crate::physics::{
    ConfigError, PlatformerEngine, SimpleEngine, DEFAULT_GRAVITY, DEFAULT_GROUND_PROBE,
};
