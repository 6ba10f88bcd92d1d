// glide2d/src/physics.rs
use anyhow::Result;
use thiserror::Error;

use crate::body::{Body, BodyId, BodyStore};
use crate::collision::{overlapping, overlaps};
use crate::math::Vec2;

/// Default downward acceleration applied per update by [`PlatformerEngine`].
pub const DEFAULT_GRAVITY: f32 = 0.5;

/// Default distance [`PlatformerEngine::can_jump`] probes below the body.
pub const DEFAULT_GROUND_PROBE: f32 = 5.0;

// Caps on the two heuristic loops whose iteration count is otherwise
// unbounded for pathological geometry.
const MAX_ESCAPE_DOUBLINGS: u32 = 32;
const MAX_SLIDE_RETRIES: u32 = 256;

/// Engine construction failures, reported before any update runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("body {0:?} is not in the store")]
    UnknownBody(BodyId),
    #[error("the controlled body cannot be part of its own obstacle set")]
    SelfObstacle,
}

/// Check an obstacle set against the store, keeping order and dropping
/// duplicate ids.
fn validated_set(
    bodies: &BodyStore,
    player: BodyId,
    set: Vec<BodyId>,
) -> Result<Vec<BodyId>, ConfigError> {
    if !bodies.contains(player) {
        return Err(ConfigError::UnknownBody(player));
    }
    let mut out = Vec::with_capacity(set.len());
    for id in set {
        if id == player {
            return Err(ConfigError::SelfObstacle);
        }
        if !bodies.contains(id) {
            return Err(ConfigError::UnknownBody(id));
        }
        if !out.contains(&id) {
            out.push(id);
        }
    }
    Ok(out)
}

// Keeps y on a hundredth grid so the fractional snap steps don't accumulate
// float drift across frames.
fn round_hundredths(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

/// Last-resort search for a nearby overlap-free position.
///
/// Probes eight offsets around the starting point at doubling distances and
/// takes the first that clears. Not physically principled, but existing level
/// geometry depends on the exact probe order.
fn escape_overlap(body: &mut Body, obstacles: &[BodyId], bodies: &BodyStore) {
    let origin = body.position;
    let mut vary = 1.0;
    for _ in 0..MAX_ESCAPE_DOUBLINGS {
        let probes = [
            Vec2::new(0.0, vary),
            Vec2::new(0.0, -vary),
            Vec2::new(vary, 0.0),
            Vec2::new(-vary, 0.0),
            Vec2::new(vary, vary),
            Vec2::new(vary, -vary),
            Vec2::new(-vary, vary),
            Vec2::new(-vary, -vary),
        ];
        for offset in probes {
            body.position = origin + offset;
            if overlapping(body, obstacles, bodies).is_empty() {
                return;
            }
        }
        vary *= 2.0;
    }
    body.position = origin;
    log::warn!(
        "no overlap-free position within {MAX_ESCAPE_DOUBLINGS} probe doublings; \
         leaving body embedded"
    );
}

/// Advance one body by its velocity and rotation, then nudge it out of any
/// overlap with `obstacles`. Returns every obstacle contacted during the
/// step, in contact order, without duplicates.
fn move_body(
    bodies: &mut BodyStore,
    moving: BodyId,
    obstacles: &[BodyId],
    ramp_up: bool,
) -> Result<Vec<BodyId>> {
    let mut body = bodies
        .remove(moving)
        .ok_or(ConfigError::UnknownBody(moving))?;
    let hits = resolve_step(&mut body, obstacles, bodies, ramp_up);
    bodies.put_back(moving, body);
    Ok(hits)
}

fn resolve_step(
    body: &mut Body,
    obstacles: &[BodyId],
    bodies: &BodyStore,
    ramp_up: bool,
) -> Vec<BodyId> {
    // Rotate. The rotation itself is never rejected; only the overlap it may
    // produce gets patched.
    body.angle += body.angular_velocity;
    if !overlapping(body, obstacles, bodies).is_empty() {
        escape_overlap(body, obstacles, bodies);
    }

    // --- Move in the y direction
    body.position.y += body.velocity.y;

    let contacts = overlapping(body, obstacles, bodies);
    let mut hits = contacts.clone();

    if !contacts.is_empty() {
        if body.velocity.y > 0.0 {
            // Hit something overhead; back down to the last clear row.
            while !overlapping(body, obstacles, bodies).is_empty() {
                body.position.y -= 1.0;
            }
        } else if body.velocity.y < 0.0 {
            for &id in &contacts {
                let Some(obstacle) = bodies.get(id) else {
                    continue;
                };
                // Nudge up until clear of this obstacle. Snapping the bottom
                // edge straight to its top doesn't work on ramps.
                while overlaps(body, obstacle) {
                    body.position.y += 0.25;
                }
                if obstacle.velocity.x != 0.0 {
                    body.position.x += obstacle.velocity.x;
                }
            }
        } else {
            // Collision while vertically stationary, most likely a moving
            // obstacle. Left uncorrected.
            log::debug!("vertical overlap while change_y is zero; leaving position as-is");
        }
        let below = bodies.get(contacts[0]).map_or(0.0, |o| o.velocity.y);
        body.velocity.y = below.min(0.0);
    }

    body.position.y = round_hundredths(body.position.y);

    // --- Move in the x direction
    body.position.x += body.velocity.x;

    let mut retries = 0;
    let mut check_again = true;
    while check_again {
        check_again = false;

        let contacts = overlapping(body, obstacles, bodies);
        for id in &contacts {
            if !hits.contains(id) {
                hits.push(*id);
            }
        }
        if contacts.is_empty() {
            break;
        }

        let change_x = body.velocity.x;
        if change_x > 0.0 {
            if ramp_up {
                for _ in &contacts {
                    // See if we can run up whatever we hit.
                    body.position.y += change_x;
                    if !overlapping(body, obstacles, bodies).is_empty() {
                        // No good; undo the lift and give back one unit.
                        body.position.y -= change_x;
                        body.position.x -= 1.0;
                        check_again = true;
                        break;
                    }
                }
            } else {
                while !overlapping(body, obstacles, bodies).is_empty() {
                    body.position.x -= 1.0;
                }
            }
        } else if change_x < 0.0 {
            if ramp_up {
                for &id in &contacts {
                    body.position.y -= change_x;
                    if !overlapping(body, obstacles, bodies).is_empty() {
                        body.position.y += change_x;
                        if let Some(obstacle) = bodies.get(id) {
                            // Shoved back to the right; the whole pass has to
                            // be rechecked.
                            let left = body.left().max(obstacle.right());
                            body.set_left(left);
                        }
                        check_again = true;
                        break;
                    }
                }
            } else {
                while !overlapping(body, obstacles, bodies).is_empty() {
                    body.position.x += 1.0;
                }
            }
        } else {
            log::warn!(
                "horizontal overlap while change_x is zero; this usually means the body \
                 was updated more than once this tick"
            );
        }

        if check_again {
            retries += 1;
            if retries >= MAX_SLIDE_RETRIES {
                log::warn!(
                    "slide-back retry cap of {MAX_SLIDE_RETRIES} reached; \
                     accepting current position"
                );
                break;
            }
        }
    }

    hits
}

/// Collision engine for games without gravity, such as top-down games.
///
/// Moves one controlled body against a set of obstacles it cannot pass
/// through. No jump state, no ramp climbing.
#[derive(Debug)]
pub struct SimpleEngine {
    player: BodyId,
    obstacles: Vec<BodyId>,
}

impl SimpleEngine {
    /// Create an engine moving `player` against `obstacles`.
    ///
    /// Fails if any id is missing from the store, or if the player is listed
    /// as one of its own obstacles. Obstacle order is kept; duplicate ids
    /// are dropped.
    pub fn new(bodies: &BodyStore, player: BodyId, obstacles: Vec<BodyId>) -> Result<Self> {
        let obstacles = validated_set(bodies, player, obstacles)?;
        Ok(Self { player, obstacles })
    }

    /// Move the controlled body and resolve collisions.
    ///
    /// Returns every obstacle contacted during the step, in contact order,
    /// without duplicates.
    pub fn update(&mut self, bodies: &mut BodyStore) -> Result<Vec<BodyId>> {
        move_body(bodies, self.player, &self.obstacles, false)
    }
}

/// Collision engine for platformers.
///
/// Adds gravity, ground detection for jump permission, multi-jump
/// bookkeeping, ramp climbing, and patrolling platforms that carry the
/// controlled body.
#[derive(Debug)]
pub struct PlatformerEngine {
    player: BodyId,
    platforms: Vec<BodyId>,
    ladders: Option<Vec<BodyId>>,
    gravity_constant: f32,
    jumps_since_ground: u32,
    allowed_jumps: u32,
    allow_multi_jump: bool,
}

impl PlatformerEngine {
    /// Create an engine moving `player` against `platforms`, with the
    /// default gravity constant.
    pub fn new(bodies: &BodyStore, player: BodyId, platforms: Vec<BodyId>) -> Result<Self> {
        let platforms = validated_set(bodies, player, platforms)?;
        Ok(Self {
            player,
            platforms,
            ladders: None,
            gravity_constant: DEFAULT_GRAVITY,
            jumps_since_ground: 0,
            allowed_jumps: 1,
            allow_multi_jump: false,
        })
    }

    /// Override the downward acceleration applied per update.
    #[must_use]
    pub fn with_gravity(mut self, gravity_constant: f32) -> Self {
        self.gravity_constant = gravity_constant;
        self
    }

    /// Attach a set of ladder bodies. Touching a ladder suspends gravity;
    /// ladders are only queried, never collided with.
    pub fn with_ladders(mut self, bodies: &BodyStore, ladders: Vec<BodyId>) -> Result<Self> {
        let ladders = validated_set(bodies, self.player, ladders)?;
        self.ladders = Some(ladders);
        Ok(self)
    }

    pub fn gravity(&self) -> f32 {
        self.gravity_constant
    }

    /// True if the controlled body currently touches a ladder. Always false
    /// when no ladder set is configured.
    pub fn is_on_ladder(&self, bodies: &BodyStore) -> bool {
        let Some(ladders) = &self.ladders else {
            return false;
        };
        let Some(player) = bodies.get(self.player) else {
            return false;
        };
        !overlapping(player, ladders, bodies).is_empty()
    }

    /// True if there is a platform within [`DEFAULT_GROUND_PROBE`] below the
    /// body, or multi-jump budget remains.
    ///
    /// Finding ground resets the jump counter.
    pub fn can_jump(&mut self, bodies: &mut BodyStore) -> bool {
        self.can_jump_within(bodies, DEFAULT_GROUND_PROBE)
    }

    /// [`can_jump`](Self::can_jump) with an explicit probe distance.
    pub fn can_jump_within(&mut self, bodies: &mut BodyStore, probe: f32) -> bool {
        let Some(mut player) = bodies.remove(self.player) else {
            return false;
        };

        // Move down to see if we are on a platform, then put things back.
        player.position.y -= probe;
        let grounded = !overlapping(&player, &self.platforms, bodies).is_empty();
        player.position.y += probe;
        bodies.put_back(self.player, player);

        if grounded {
            self.jumps_since_ground = 0;
        }
        grounded || (self.allow_multi_jump && self.jumps_since_ground < self.allowed_jumps)
    }

    /// Enable multi-jump. `allowed_jumps` includes the initial jump: 1
    /// allows only a single jump, 2 enables double-jump, and so on.
    ///
    /// While multi-jump is enabled, every jump must go through
    /// [`jump`](Self::jump) or be reported with
    /// [`increment_jump_counter`](Self::increment_jump_counter), or the
    /// budget never runs out.
    pub fn enable_multi_jump(&mut self, allowed_jumps: u32) {
        self.allowed_jumps = allowed_jumps;
        self.allow_multi_jump = true;
    }

    /// Disable multi-jump and reset the jump budget to a single jump.
    pub fn disable_multi_jump(&mut self) {
        self.allow_multi_jump = false;
        self.allowed_jumps = 1;
        self.jumps_since_ground = 0;
    }

    /// Launch the body upward and count the jump.
    pub fn jump(&mut self, bodies: &mut BodyStore, velocity: f32) {
        if let Some(player) = bodies.get_mut(self.player) {
            player.velocity.y = velocity;
        }
        self.increment_jump_counter();
    }

    /// Count one jump against the multi-jump budget. Games that set the
    /// vertical velocity themselves instead of calling [`jump`](Self::jump)
    /// must call this once per jump.
    pub fn increment_jump_counter(&mut self) {
        if self.allow_multi_jump {
            self.jumps_since_ground += 1;
        }
    }

    /// Apply gravity, move the controlled body with ramp climbing, then
    /// advance every moving platform along its patrol.
    ///
    /// Returns every platform contacted during the step, in contact order,
    /// without duplicates.
    pub fn update(&mut self, bodies: &mut BodyStore) -> Result<Vec<BodyId>> {
        // Gravity is suspended while hanging on a ladder.
        if !self.is_on_ladder(bodies) {
            if let Some(player) = bodies.get_mut(self.player) {
                player.velocity.y -= self.gravity_constant;
            }
        }

        let hits = move_body(bodies, self.player, &self.platforms, true)?;

        for &id in &self.platforms {
            let Some(mut platform) = bodies.remove(id) else {
                continue;
            };
            if platform.velocity.x != 0.0 || platform.velocity.y != 0.0 {
                self.advance_platform(bodies, &mut platform);
            }
            bodies.put_back(id, platform);
        }

        Ok(hits)
    }

    /// Step one kinematic platform along its patrol, bouncing off its
    /// boundaries and shoving the controlled body out of the way.
    fn advance_platform(&self, bodies: &mut BodyStore, platform: &mut Body) {
        platform.position.x += platform.velocity.x;

        if let Some(bound) = platform.boundary_left {
            if platform.left() <= bound {
                platform.set_left(bound);
                if platform.velocity.x < 0.0 {
                    platform.velocity.x *= -1.0;
                }
            }
        }
        if let Some(bound) = platform.boundary_right {
            if platform.right() >= bound {
                platform.set_right(bound);
                if platform.velocity.x > 0.0 {
                    platform.velocity.x *= -1.0;
                }
            }
        }

        // A horizontally moving platform drags the body flush against its
        // trailing edge instead of passing through it.
        let pushed = bodies
            .get(self.player)
            .map_or(false, |player| overlaps(player, platform));
        if pushed {
            if let Some(player) = bodies.get_mut(self.player) {
                if platform.velocity.x < 0.0 {
                    player.set_right(platform.left());
                }
                if platform.velocity.x > 0.0 {
                    player.set_left(platform.right());
                }
            }
        }

        platform.position.y += platform.velocity.y;

        if let Some(bound) = platform.boundary_top {
            if platform.top() >= bound {
                platform.set_top(bound);
                if platform.velocity.y > 0.0 {
                    platform.velocity.y *= -1.0;
                }
            }
        }
        if let Some(bound) = platform.boundary_bottom {
            if platform.bottom() <= bound {
                platform.set_bottom(bound);
                if platform.velocity.y < 0.0 {
                    platform.velocity.y *= -1.0;
                }
            }
        }
    }
}
