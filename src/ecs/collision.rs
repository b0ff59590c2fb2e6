// src/ecs/collision.rs
//! Pairwise shape tests.
//!
//! Rect-rect and circle-circle use strict inequalities, so shapes that only
//! touch do not collide. Circle-rect tests allow `CONTACT_EPSILON` of overlap,
//! which keeps a circle that the resolver has placed exactly tangent to a
//! rect from registering again on the next query.

use image::Rgba;

use super::components::{Collider, Shape};
use crate::engine::math::{tile_pos, vec2, TilePos, Vec2};
use crate::game::tilemap::Tilemap;

pub const CONTACT_EPSILON: f32 = 0.001;

const TILE_COLLIDER_COLOR: Rgba<u8> = Rgba([255, 255, 255, 50]);

pub fn point_in_rect(point: Vec2, position: Vec2, size: Vec2) -> bool {
    point.x > position.x
        && point.x < position.x + size.x
        && point.y > position.y
        && point.y < position.y + size.y
}

pub fn point_in_circle(point: Vec2, center: Vec2, radius: f32) -> bool {
    (center - point).norm() < radius
}

pub fn rect_rect(a_pos: Vec2, a_size: Vec2, b_pos: Vec2, b_size: Vec2) -> bool {
    a_pos.x < b_pos.x + b_size.x
        && a_pos.x + a_size.x > b_pos.x
        && a_pos.y < b_pos.y + b_size.y
        && a_pos.y + a_size.y > b_pos.y
}

/// Point of the rect nearest to `point`.
pub fn clamp_to_rect(point: Vec2, position: Vec2, size: Vec2) -> Vec2 {
    vec2(
        point.x.clamp(position.x, position.x + size.x),
        point.y.clamp(position.y, position.y + size.y),
    )
}

pub fn rect_circle(rect_pos: Vec2, rect_size: Vec2, center: Vec2, radius: f32) -> bool {
    let nearest = clamp_to_rect(center, rect_pos, rect_size);
    radius - (center - nearest).norm() > CONTACT_EPSILON
}

pub fn circle_circle(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32) -> bool {
    (a - b).norm() < a_radius + b_radius
}

/// Shape-only intersection test; leaves both colliders untouched.
pub fn intersects(a: &Collider, b: &Collider) -> bool {
    match (a.shape, b.shape) {
        (Shape::Rect { size: a_size }, Shape::Rect { size: b_size }) => {
            rect_rect(a.position, a_size, b.position, b_size)
        }
        (Shape::Rect { size }, Shape::Circle { radius }) => {
            rect_circle(a.position, size, b.position, radius)
        }
        (Shape::Circle { radius }, Shape::Rect { size }) => {
            rect_circle(b.position, size, a.position, radius)
        }
        (Shape::Circle { radius: a_radius }, Shape::Circle { radius: b_radius }) => {
            circle_circle(a.position, a_radius, b.position, b_radius)
        }
    }
}

// Each test overwrites `is_colliding` with its own result. Mismatched shape
// tests leave it alone.
impl Collider {
    fn mark(&mut self, hit: bool) -> bool {
        self.is_colliding = hit;
        hit
    }

    pub fn collide_point(&mut self, point: Vec2) -> bool {
        let hit = match self.shape {
            Shape::Rect { size } => point_in_rect(point, self.position, size),
            Shape::Circle { radius } => point_in_circle(point, self.position, radius),
        };
        self.mark(hit)
    }

    /// Tests against a rect collider. Returns false for any other shape.
    pub fn collide_rect(&mut self, other: &Collider) -> bool {
        if !matches!(other.shape, Shape::Rect { .. }) {
            return false;
        }
        let hit = intersects(self, other);
        self.mark(hit)
    }

    /// Tests against a circle collider. Returns false for any other shape.
    pub fn collide_circle(&mut self, other: &Collider) -> bool {
        if !matches!(other.shape, Shape::Circle { .. }) {
            return false;
        }
        let hit = intersects(self, other);
        self.mark(hit)
    }

    /// Runs the rect or circle test depending on what `other` is.
    pub fn collide(&mut self, other: &Collider) -> bool {
        match other.shape {
            Shape::Rect { .. } => self.collide_rect(other),
            Shape::Circle { .. } => self.collide_circle(other),
        }
    }
}

/// A blocking tile overlapping a collider. The rect is built for the query
/// and never registered.
#[derive(Debug, Clone, PartialEq)]
pub struct TileContact {
    pub tile: TilePos,
    pub collider: Collider,
}

/// Every blocking tile intersecting `probe`, searched over its bounding box
/// plus a one-tile margin. Marks `probe` as colliding if there is any.
pub fn tile_contacts(probe: &mut Collider, tilemap: &Tilemap) -> Vec<TileContact> {
    let (min, max) = probe.bounds();
    let first = tilemap.world_to_tile(min) - tile_pos(1, 1);
    let last = tilemap.world_to_tile(max) + tile_pos(1, 1);
    let tile_size = tilemap.tile_size() as f32;

    let mut contacts = Vec::new();
    for x in first.x..=last.x {
        for y in first.y..=last.y {
            let tile = tile_pos(x, y);
            if !tilemap.is_blocking(tile) {
                continue;
            }
            let collider = Collider::rect(tilemap.tile_to_world(tile), vec2(tile_size, tile_size))
                .visible(TILE_COLLIDER_COLOR);
            if intersects(probe, &collider) {
                contacts.push(TileContact { tile, collider });
            }
        }
    }
    if !contacts.is_empty() {
        probe.is_colliding = true;
    }
    contacts
}
