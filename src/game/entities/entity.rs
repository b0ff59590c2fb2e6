// src/game/entities/entity.rs
//! Bodies: a `Body` and its solid `Collider` on one entity, moved one axis
//! at a time and stopped flush against whatever blocks them.

use log::{debug, trace};

use crate::ecs::collision::tile_contacts;
use crate::ecs::{Body, Collider, CollisionFilter, Handle, PhysicsWorld, Shape};
use crate::engine::math::{Axis, Vec2, VectorExt};
use crate::error::{Error, Result};
use crate::game::tilemap::Tilemap;

/// Which axes were blocked during a move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    pub blocked_x: bool,
    pub blocked_y: bool,
}

impl MoveOutcome {
    pub fn blocked(&self, axis: Axis) -> bool {
        match axis {
            Axis::X => self.blocked_x,
            Axis::Y => self.blocked_y,
        }
    }

    pub fn any(&self) -> bool {
        self.blocked_x || self.blocked_y
    }

    fn block(&mut self, axis: Axis) {
        match axis {
            Axis::X => self.blocked_x = true,
            Axis::Y => self.blocked_y = true,
        }
    }
}

pub(crate) fn missing(handle: Handle, component: &'static str) -> Error {
    Error::MissingComponent { handle, component }
}

/// Creates a body at `position` owning `collider`. The offset between the two
/// is kept for the body's whole life.
pub fn spawn_body(world: &mut PhysicsWorld, position: Vec2, collider: Collider) -> Handle {
    let body = Body::new(position, collider.position);
    let handle = world.add_owned_collider(collider, body);
    debug!("spawned body {:?} at ({}, {})", handle, position.x, position.y);
    handle
}

/// Removes a body and deregisters its collider. False if `handle` is not a
/// live body.
pub fn despawn_body(world: &mut PhysicsWorld, handle: Handle) -> bool {
    if world.component::<Body>(handle).is_none() {
        return false;
    }
    debug!("despawned body {:?}", handle);
    world.remove(handle)
}

/// Applies acceleration, then moves.
pub fn physics_update(
    world: &mut PhysicsWorld,
    tilemap: &Tilemap,
    handle: Handle,
    delta: f32,
) -> Result<MoveOutcome> {
    let body = world
        .component_mut::<Body>(handle)
        .ok_or_else(|| missing(handle, "Body"))?;
    body.velocity += body.accel * delta;
    move_and_collide(world, tilemap, handle, delta)
}

/// Moves a body by `velocity * delta`, x first, then y. On each axis the body
/// is stopped flush against any solid collider or blocking tile it ran into,
/// and its velocity on that axis is zeroed. Areas never block.
pub fn move_and_collide(
    world: &mut PhysicsWorld,
    tilemap: &Tilemap,
    handle: Handle,
    delta: f32,
) -> Result<MoveOutcome> {
    let mut body = world
        .component::<Body>(handle)
        .cloned()
        .ok_or_else(|| missing(handle, "Body"))?;
    let mut collider = world
        .collider(handle)
        .cloned()
        .ok_or_else(|| missing(handle, "Collider"))?;

    let mut outcome = MoveOutcome::default();
    for axis in Axis::BOTH {
        let i = axis.index();
        let velocity = body.velocity[i];
        collider.position[i] += velocity * delta;

        // A body at rest on this axis cannot run into anything
        if velocity != 0.0 {
            let obstacles = blocking_obstacles(world, tilemap, handle, &mut collider);
            let mut resolved = false;
            for obstacle in &obstacles {
                if let Some(target) = contact_position(&collider, obstacle, axis, velocity) {
                    collider.position[i] = target;
                    resolved = true;
                }
            }
            if resolved {
                trace!("body {:?} blocked on {:?}", handle, axis);
                body.velocity[i] = 0.0;
                collider.position = collider.position.corrected();
                outcome.block(axis);
            }
        }

        body.position = collider.position + body.collider_offset;
    }

    if let Some(stored) = world.collider_mut(handle) {
        *stored = collider;
    }
    if let Some(stored) = world.component_mut::<Body>(handle) {
        *stored = body;
    }
    Ok(outcome)
}

// Solid colliders and blocking tiles overlapping `collider`
fn blocking_obstacles(
    world: &PhysicsWorld,
    tilemap: &Tilemap,
    handle: Handle,
    collider: &mut Collider,
) -> Vec<Collider> {
    let mut obstacles: Vec<Collider> = world
        .overlapping(collider, Some(handle), CollisionFilter::Bodies)
        .into_iter()
        .map(|(_, other)| other)
        .collect();
    if !obstacles.is_empty() {
        collider.is_colliding = true;
    }
    obstacles.extend(tile_contacts(collider, tilemap).into_iter().map(|contact| contact.collider));
    obstacles
}

// Distance from `point` to the span [start, start + length], 0 inside it
fn span_gap(point: f32, start: f32, length: f32) -> f32 {
    if point < start {
        start - point
    } else if point > start + length {
        point - (start + length)
    } else {
        0.0
    }
}

// How far along the moving axis a circle reaches at the given perpendicular gap
fn tangent_reach(radius: f32, gap: f32) -> f32 {
    (radius * radius - gap * gap).max(0.0).sqrt()
}

// Centre of `collider` on axis `i`
fn center_on(collider: &Collider, i: usize) -> f32 {
    match collider.shape {
        Shape::Rect { size } => collider.position[i] + size[i] / 2.0,
        Shape::Circle { .. } => collider.position[i],
    }
}

/// Position of `mover` on `axis` that leaves its leading edge touching
/// `obstacle`. `None` if the obstacle is behind the mover or the mover is
/// already clear of it, so a contact never pushes the mover forward.
pub fn contact_position(
    mover: &Collider,
    obstacle: &Collider,
    axis: Axis,
    velocity: f32,
) -> Option<f32> {
    let i = axis.index();
    let j = axis.other().index();
    let forward = velocity > 0.0;

    // Only the leading edge resolves; overlaps behind the mover are left alone
    let ahead = center_on(obstacle, i) - center_on(mover, i);
    if (forward && ahead < 0.0) || (!forward && ahead > 0.0) {
        return None;
    }

    let at = obstacle.position[i];

    let target = match (mover.shape, obstacle.shape) {
        (Shape::Rect { size }, Shape::Rect { size: other }) => {
            if forward {
                at - size[i]
            } else {
                at + other[i]
            }
        }
        (Shape::Rect { size }, Shape::Circle { radius }) => {
            let gap = span_gap(obstacle.position[j], mover.position[j], size[j]);
            let reach = tangent_reach(radius, gap);
            if forward {
                at - reach - size[i]
            } else {
                at + reach
            }
        }
        (Shape::Circle { radius }, Shape::Rect { size }) => {
            let gap = span_gap(mover.position[j], obstacle.position[j], size[j]);
            let reach = tangent_reach(radius, gap);
            if forward {
                at - reach
            } else {
                at + size[i] + reach
            }
        }
        (Shape::Circle { radius }, Shape::Circle { radius: other }) => {
            let gap = mover.position[j] - obstacle.position[j];
            let reach = tangent_reach(radius + other, gap);
            if forward {
                at - reach
            } else {
                at + reach
            }
        }
    };

    let current = mover.position[i];
    let clear = if forward { current < target } else { current > target };
    (!clear).then_some(target)
}
