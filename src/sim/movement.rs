//! Avatar steering
//!
//! Players push a direction, the avatar walks toward `pos + direction` at a
//! fixed speed. Bots never send input; their targets are set by the round.

use glam::Vec2;

use super::arena::{Arena, BodyId};
use super::state::{ActionState, Avatar, Orientation};
use crate::consts::*;
use crate::ellipse_point;
use crate::settings::CarouselConfig;
use crate::slot_angle;

/// Spawn point of player `index` out of `count` on the outer ring
pub fn start_ring_point(index: usize, count: usize) -> Vec2 {
    ellipse_point(ARENA_CENTER, START_RING, slot_angle(index, count))
}

/// Point bot `index` heads to on the carousel
pub fn carousel_point(index: usize, count: usize, radius: f32) -> Vec2 {
    ellipse_point(ARENA_CENTER, Vec2::splat(radius), slot_angle(index, count))
}

/// Steer an avatar by a player-submitted direction
///
/// Screen y grows downward, input y grows upward.
pub fn apply_vector(avatar: &mut Avatar, arena: &mut Arena, direction: Vec2, config: &CarouselConfig) {
    if !avatar.is_released() {
        return;
    }
    avatar.target = avatar.pos + Vec2::new(direction.x, -direction.y);
    update_player_vector(avatar, arena, config);
}

/// Recompute velocity, state and facing from the avatar's target
pub fn update_player_vector(avatar: &mut Avatar, arena: &mut Arena, config: &CarouselConfig) {
    let id = BodyId::Avatar(avatar.id);
    if !arena.contains(id) || !avatar.is_released() {
        return;
    }

    if avatar.item_id.is_none() {
        arena.set_collides(id, true);
    }

    let to_target = avatar.target - avatar.pos;
    if to_target.length() > config.min_motion {
        avatar.action = ActionState::Walk;
        avatar.orientation = Orientation::from_vector(Vec2::new(to_target.x, -to_target.y));
        arena.set_velocity(id, to_target.normalize() * config.player_speed);
    } else {
        avatar.action = ActionState::Idle;
        arena.set_velocity(id, Vec2::ZERO);
    }
}
