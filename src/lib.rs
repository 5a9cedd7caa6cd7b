//! Carousel - the between-rounds pickup minigame
//!
//! Core modules:
//! - `sim`: Deterministic simulation (arena physics, claims, round lifecycle)
//! - `catalog`: Items, synergies and dungeon maps offered by the carousel
//! - `game`: Interface to the outer turn-based game (player records, hooks)
//! - `settings`: Data-driven carousel balance

pub mod catalog;
pub mod game;
pub mod settings;
pub mod sim;

pub use game::{GameHooks, HookEvent, Player, PlayerId, RecordingHooks, SpecialRule};
pub use settings::CarouselConfig;

use glam::Vec2;

/// Arena configuration constants
pub mod consts {
    use glam::Vec2;

    /// Fixed simulation timestep used by the demo driver (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Centre of the carousel, everything orbits around it
    pub const ARENA_CENTER: Vec2 = Vec2::new(325.0, 250.0);

    /// Inner edges of the static boundary walls
    pub const WALL_MIN: Vec2 = Vec2::new(-50.0, -50.0);
    pub const WALL_MAX: Vec2 = Vec2::new(720.0, 590.0);

    /// Playable rectangle bodies get clamped back into after a step
    pub const PLAYABLE_MIN: Vec2 = Vec2::new(0.0, 0.0);
    pub const PLAYABLE_MAX: Vec2 = Vec2::new(720.0, 590.0);

    /// Body radii
    pub const AVATAR_RADIUS: f32 = 25.0;
    pub const ITEM_RADIUS: f32 = 20.0;
    pub const PORTAL_RADIUS: f32 = 30.0;

    /// Starting ring avatars spawn on (ellipse radii)
    pub const START_RING: Vec2 = Vec2::new(300.0, 250.0);
    /// Initial item layout before the orbit takes over (ellipse radii)
    pub const ITEM_RING: Vec2 = Vec2::new(100.0, 90.0);
    /// Initial portal layout radius
    pub const PORTAL_RING_RADIUS: f32 = 115.0;
}

/// Point on an axis-aligned ellipse around `center`
#[inline]
pub fn ellipse_point(center: Vec2, radii: Vec2, theta: f32) -> Vec2 {
    center + Vec2::new(radii.x * theta.cos(), radii.y * theta.sin())
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Angle of slot `index` out of `count` equally spaced slots
#[inline]
pub fn slot_angle(index: usize, count: usize) -> f32 {
    if count == 0 {
        return 0.0;
    }
    std::f32::consts::TAU * index as f32 / count as f32
}
