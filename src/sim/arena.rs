//! Bounded 2D arena physics
//!
//! Circles moving inside four static, perfectly elastic walls. Solid bodies
//! push each other apart; sensors overlap freely but still report contacts.
//! Each step returns the pairs that *began* touching, sorted by id so that
//! claim resolution happens in a reproducible order.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::game::PlayerId;

/// Body address, shared with the entity owning the body
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BodyId {
    Avatar(PlayerId),
    Item(u32),
    Portal(u32),
}

/// A circular rigid body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: BodyId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Sensors report contacts but exert no force
    pub sensor: bool,
    /// Disabled bodies take part in no pair at all (mask = 0)
    pub collides: bool,
}

impl Body {
    pub fn overlaps(&self, other: &Body) -> bool {
        let reach = self.radius + other.radius;
        self.pos.distance_squared(other.pos) < reach * reach
    }
}

/// Pair of bodies that started touching this step, `a < b`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Contact {
    pub a: BodyId,
    pub b: BodyId,
}

impl Contact {
    pub fn new(x: BodyId, y: BodyId) -> Self {
        if x <= y { Self { a: x, b: y } } else { Self { a: y, b: x } }
    }
}

/// Keeps `body` at a fixed offset from `anchor`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Link {
    pub anchor: BodyId,
    pub body: BodyId,
    pub offset: Vec2,
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// The arena world
#[derive(Debug, Clone, Default)]
pub struct Arena {
    bodies: BTreeMap<BodyId, Body>,
    links: Vec<Link>,
    /// Pairs overlapping at the end of the previous step
    touching: BTreeSet<Contact>,
    /// Simulated seconds since creation
    elapsed: f32,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds of simulated time
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains_key(&id)
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    pub fn ids(&self) -> Vec<BodyId> {
        self.bodies.keys().copied().collect()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Add a circle; collisions start enabled
    pub fn add_circle(&mut self, id: BodyId, pos: Vec2, radius: f32, sensor: bool) {
        debug_assert!(!self.bodies.contains_key(&id), "duplicate body {id:?}");
        self.bodies.insert(
            id,
            Body {
                id,
                pos,
                vel: Vec2::ZERO,
                radius,
                sensor,
                collides: true,
            },
        );
    }

    /// Remove a body together with its links and contact history
    pub fn remove(&mut self, id: BodyId) -> Option<Body> {
        self.links.retain(|l| l.anchor != id && l.body != id);
        self.touching.retain(|c| c.a != id && c.b != id);
        self.bodies.remove(&id)
    }

    /// Remove every body and link and restart the clock
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.links.clear();
        self.touching.clear();
        self.elapsed = 0.0;
    }

    pub fn set_position(&mut self, id: BodyId, pos: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.pos = pos;
        }
    }

    pub fn set_velocity(&mut self, id: BodyId, vel: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.vel = vel;
        }
    }

    pub fn set_collides(&mut self, id: BodyId, collides: bool) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.collides = collides;
        }
    }

    /// Pin `body` to `anchor` at their current offset
    pub fn link(&mut self, anchor: BodyId, body: BodyId) {
        let (Some(a), Some(b)) = (self.bodies.get(&anchor), self.bodies.get(&body)) else {
            return;
        };
        let offset = b.pos - a.pos;
        self.links.push(Link { anchor, body, offset });
    }

    /// Advance all bodies by `dt` seconds, returning contacts that began
    pub fn step(&mut self, dt: f32) -> Vec<Contact> {
        self.elapsed += dt;

        for body in self.bodies.values_mut() {
            body.pos += body.vel * dt;
        }

        self.separate_solids();
        self.bounce_off_walls();
        self.apply_links();

        let current = self.overlapping_pairs();
        let began: Vec<Contact> = current.difference(&self.touching).copied().collect();
        self.touching = current;
        began
    }

    /// Pull a body back inside the playable rectangle if it drifted out
    pub fn clamp_to_playable(&mut self, id: BodyId) -> bool {
        let Some(body) = self.bodies.get_mut(&id) else {
            return false;
        };
        let clamped = body.pos.clamp(PLAYABLE_MIN, PLAYABLE_MAX);
        if clamped != body.pos {
            body.pos = clamped;
            true
        } else {
            false
        }
    }

    fn separate_solids(&mut self) {
        let solids: Vec<BodyId> = self
            .bodies
            .values()
            .filter(|b| b.collides && !b.sensor)
            .map(|b| b.id)
            .collect();

        for (i, &a) in solids.iter().enumerate() {
            for &b in &solids[i + 1..] {
                let (pa, ra) = (self.bodies[&a].pos, self.bodies[&a].radius);
                let (pb, rb) = (self.bodies[&b].pos, self.bodies[&b].radius);
                let delta = pb - pa;
                let dist = delta.length();
                let penetration = ra + rb - dist;
                if penetration <= 0.0 {
                    continue;
                }
                // Coincident centres: push apart horizontally
                let normal = if dist > 1e-4 { delta / dist } else { Vec2::X };
                let push = normal * (penetration / 2.0);
                // Equal masses: approaching bodies swap their normal speeds
                let (va, vb) = (self.bodies[&a].vel, self.bodies[&b].vel);
                let closing = (va - vb).dot(normal);
                let exchange = if closing > 0.0 { normal * closing } else { Vec2::ZERO };
                if let Some(body) = self.bodies.get_mut(&a) {
                    body.pos -= push;
                    body.vel -= exchange;
                }
                if let Some(body) = self.bodies.get_mut(&b) {
                    body.pos += push;
                    body.vel += exchange;
                }
            }
        }
    }

    fn bounce_off_walls(&mut self) {
        for body in self.bodies.values_mut().filter(|b| b.collides && !b.sensor) {
            let r = body.radius;
            let walls = [
                (body.pos.x - r < WALL_MIN.x, Vec2::X),
                (body.pos.x + r > WALL_MAX.x, Vec2::NEG_X),
                (body.pos.y - r < WALL_MIN.y, Vec2::Y),
                (body.pos.y + r > WALL_MAX.y, Vec2::NEG_Y),
            ];
            for (hit, normal) in walls {
                if hit && body.vel.dot(normal) < 0.0 {
                    body.vel = reflect_velocity(body.vel, normal);
                }
            }
            body.pos = body.pos.clamp(WALL_MIN + Vec2::splat(r), WALL_MAX - Vec2::splat(r));
        }
    }

    fn apply_links(&mut self) {
        for link in &self.links {
            let Some(anchor) = self.bodies.get(&link.anchor) else {
                continue;
            };
            let (pos, vel) = (anchor.pos + link.offset, anchor.vel);
            if let Some(body) = self.bodies.get_mut(&link.body) {
                body.pos = pos;
                body.vel = vel;
            }
        }
    }

    fn overlapping_pairs(&self) -> BTreeSet<Contact> {
        let active: Vec<&Body> = self.bodies.values().filter(|b| b.collides).collect();
        let mut pairs = BTreeSet::new();
        for (i, a) in active.iter().enumerate() {
            for b in &active[i + 1..] {
                if a.overlaps(b) {
                    pairs.insert(Contact::new(a.id, b.id));
                }
            }
        }
        pairs
    }
}
