// src/game/entities/projectile.rs
//! Projectiles: short-lived circle areas that report what they touch.
//!
//! Hooks are events. Each `update_projectiles` pass returns the area
//! enter/exit transitions, body and tile hits, and expiries it saw, and the
//! caller reacts to them.

use std::collections::HashSet;

use image::Rgba;
use log::{debug, trace, warn};

use super::entity::missing;
use crate::ecs::collision::tile_contacts;
use crate::ecs::{intersects, Collider, CollisionFilter, Handle, PhysicsWorld, Shape};
use crate::engine::math::{Axis, TilePos, Vec2, VectorExt};
use crate::error::Result;
use crate::game::tilemap::Tilemap;

const PROJECTILE_COLOR: Rgba<u8> = Rgba([255, 255, 0, 200]);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectileKind {
    /// Passes through everything, reporting hits.
    Plain,
    /// Bounces off bodies and tiles, one axis at a time. Post-bounce velocity
    /// is scaled by `bounciness`.
    Bouncy { bounciness: f32 },
}

// Projectile component, lives next to its circle collider
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub position: Vec2,
    pub velocity: Vec2,
    pub accel: Vec2,
    /// Seconds alive.
    pub timer: f32,
    pub lifetime: f32,
    /// Areas overlapped at the end of the last update.
    pub areas: HashSet<Handle>,
    pub kind: ProjectileKind,
}

impl Projectile {
    pub fn new(position: Vec2, velocity: Vec2, lifetime: f32) -> Self {
        Self {
            position,
            velocity,
            accel: Vec2::zeros(),
            timer: 0.0,
            lifetime,
            areas: HashSet::new(),
            kind: ProjectileKind::Plain,
        }
    }

    pub fn with_accel(mut self, accel: Vec2) -> Self {
        self.accel = accel;
        self
    }

    pub fn bouncy(mut self, bounciness: f32) -> Self {
        self.kind = ProjectileKind::Bouncy { bounciness };
        self
    }
}

/// What a projectile ran into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Obstacle {
    Collider(Handle),
    Tile(TilePos),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectileEvent {
    AreaEntered { projectile: Handle, area: Handle },
    AreaExited { projectile: Handle, area: Handle },
    /// A solid collider or blocking tile was hit. `normal` is the push a
    /// bouncy projectile took, if it bounced.
    Collision {
        projectile: Handle,
        obstacle: Obstacle,
        normal: Option<Vec2>,
    },
    /// Lifetime ran out and the projectile was removed.
    Expired { projectile: Handle },
}

/// Registers a projectile with a visible circle area of `radius`.
pub fn spawn_projectile(world: &mut PhysicsWorld, projectile: Projectile, radius: f32) -> Handle {
    let collider = Collider::circle(projectile.position, radius)
        .area()
        .visible(PROJECTILE_COLOR);
    let handle = world.add_owned_collider(collider, projectile);
    trace!("spawned projectile {:?}", handle);
    handle
}

pub fn spawn_bouncy_projectile(
    world: &mut PhysicsWorld,
    position: Vec2,
    radius: f32,
    velocity: Vec2,
    bounciness: f32,
    lifetime: f32,
) -> Handle {
    let projectile = Projectile::new(position, velocity, lifetime).bouncy(bounciness);
    spawn_projectile(world, projectile, radius)
}

/// Removes a projectile and its collider. Killing a dead projectile is a
/// no-op that returns false.
pub fn kill_projectile(world: &mut PhysicsWorld, handle: Handle) -> bool {
    if world.component::<Projectile>(handle).is_none() {
        return false;
    }
    world.remove(handle)
}

pub fn projectile_count(world: &PhysicsWorld) -> usize {
    world.count::<Projectile>()
}

/// Steps every live projectile once. Projectiles are snapshotted first, so
/// anything killed mid-pass is skipped.
pub fn update_projectiles(
    world: &mut PhysicsWorld,
    tilemap: &Tilemap,
    delta: f32,
) -> Vec<ProjectileEvent> {
    let mut events = Vec::new();
    for handle in world.handles_with::<Projectile>() {
        if !world.contains(handle) {
            continue;
        }
        if let Err(err) = step(world, tilemap, handle, delta, &mut events) {
            warn!("projectile {:?} skipped: {}", handle, err);
        }
    }
    events
}

// A single hit found by a query
struct Hit {
    obstacle: Obstacle,
    collider: Collider,
}

fn step(
    world: &mut PhysicsWorld,
    tilemap: &Tilemap,
    handle: Handle,
    delta: f32,
    events: &mut Vec<ProjectileEvent>,
) -> Result<()> {
    let mut projectile = world
        .component::<Projectile>(handle)
        .cloned()
        .ok_or_else(|| missing(handle, "Projectile"))?;
    let mut collider = world
        .collider(handle)
        .cloned()
        .ok_or_else(|| missing(handle, "Collider"))?;

    projectile.timer += delta;
    projectile.velocity += projectile.accel * delta;
    let mut touched = HashSet::new();

    match projectile.kind {
        ProjectileKind::Plain => {
            projectile.position += projectile.velocity * delta;
            collider.position = projectile.position;
            for hit in query_hits(world, tilemap, handle, &mut collider) {
                if !record_area(world, handle, &hit, &projectile.areas, &mut touched, events) {
                    events.push(ProjectileEvent::Collision {
                        projectile: handle,
                        obstacle: hit.obstacle,
                        normal: None,
                    });
                }
            }
        }
        ProjectileKind::Bouncy { bounciness } => {
            let heading = projectile.velocity;
            for axis in Axis::BOTH {
                let i = axis.index();
                projectile.position[i] += projectile.velocity[i] * delta;
                collider.position = projectile.position;

                for hit in query_hits(world, tilemap, handle, &mut collider) {
                    if record_area(world, handle, &hit, &projectile.areas, &mut touched, events) {
                        continue;
                    }
                    // an earlier bounce this axis may already have cleared it
                    let normal = if intersects(&collider, &hit.collider) {
                        bounce_normal(&collider, &hit.collider, axis, heading[i])
                    } else {
                        None
                    };
                    if let Some(normal) = normal {
                        projectile.position += normal;
                        collider.position = projectile.position;
                        projectile.velocity = projectile.velocity.reflect(&normal) * bounciness;
                    }
                    events.push(ProjectileEvent::Collision {
                        projectile: handle,
                        obstacle: hit.obstacle,
                        normal,
                    });
                }
            }
        }
    }

    for &area in projectile.areas.difference(&touched) {
        events.push(ProjectileEvent::AreaExited {
            projectile: handle,
            area,
        });
    }
    projectile.areas = touched;

    let expired = projectile.timer > projectile.lifetime;
    if let Some(stored) = world.collider_mut(handle) {
        *stored = collider;
    }
    if let Some(stored) = world.component_mut::<Projectile>(handle) {
        *stored = projectile;
    }

    if expired && kill_projectile(world, handle) {
        debug!("projectile {:?} expired", handle);
        events.push(ProjectileEvent::Expired { projectile: handle });
    }
    Ok(())
}

// Every registered collider and blocking tile overlapping `collider`
fn query_hits(
    world: &PhysicsWorld,
    tilemap: &Tilemap,
    handle: Handle,
    collider: &mut Collider,
) -> Vec<Hit> {
    let mut hits: Vec<Hit> = world
        .overlapping(collider, Some(handle), CollisionFilter::All)
        .into_iter()
        .map(|(other, shape)| Hit {
            obstacle: Obstacle::Collider(other),
            collider: shape,
        })
        .collect();
    if !hits.is_empty() {
        collider.is_colliding = true;
    }
    hits.extend(tile_contacts(collider, tilemap).into_iter().map(|contact| Hit {
        obstacle: Obstacle::Tile(contact.tile),
        collider: contact.collider,
    }));
    hits
}

// Tracks area hits; returns false for anything solid
fn record_area(
    world: &mut PhysicsWorld,
    projectile: Handle,
    hit: &Hit,
    previous: &HashSet<Handle>,
    touched: &mut HashSet<Handle>,
    events: &mut Vec<ProjectileEvent>,
) -> bool {
    let Obstacle::Collider(area) = hit.obstacle else {
        return false;
    };
    if !hit.collider.is_area {
        return false;
    }
    if let Some(collider) = world.collider_mut(area) {
        collider.is_colliding = true;
    }
    if touched.insert(area) && !previous.contains(&area) {
        events.push(ProjectileEvent::AreaEntered { projectile, area });
    }
    true
}

/// Push that moves `circle` out of `obstacle` along `axis`, given the
/// projectile's velocity on that axis at the start of the step. Rects push
/// the circle tangent to their near face; circles push along the line
/// between centres by the overlap depth.
pub fn bounce_normal(
    circle: &Collider,
    obstacle: &Collider,
    axis: Axis,
    heading: f32,
) -> Option<Vec2> {
    let Shape::Circle { radius } = circle.shape else {
        return None;
    };
    match obstacle.shape {
        Shape::Rect { size } => {
            let i = axis.index();
            let push = if heading < 0.0 {
                obstacle.position[i] + size[i] - circle.position[i] + radius
            } else if heading > 0.0 {
                obstacle.position[i] - circle.position[i] - radius
            } else {
                return None;
            };
            Some(axis.unit() * push)
        }
        Shape::Circle { radius: other } => {
            let between = circle.position - obstacle.position;
            let depth = other - between.norm() + radius;
            let normal = between.normalized_or_zero() * depth;
            (normal != Vec2::zeros()).then_some(normal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::math::{tile_pos, vec2};
    use crate::game::tilemap::TileSet;

    fn empty_map() -> Tilemap {
        Tilemap::new(TileSet::generated(16), 8, 16)
    }

    #[test]
    fn areas_fire_enter_then_exit() {
        let mut world = PhysicsWorld::new();
        let tilemap = empty_map();
        let zone = world.add_collider(Collider::rect(vec2(10.0, -5.0), vec2(10.0, 10.0)).area());
        let shot = spawn_projectile(
            &mut world,
            Projectile::new(vec2(0.0, 0.0), vec2(100.0, 0.0), 5.0),
            2.0,
        );

        let events = update_projectiles(&mut world, &tilemap, 0.1);
        assert_eq!(events, vec![ProjectileEvent::AreaEntered { projectile: shot, area: zone }]);

        // still inside, nothing new
        let events = update_projectiles(&mut world, &tilemap, 0.05);
        assert!(events.is_empty());

        let events = update_projectiles(&mut world, &tilemap, 0.1);
        assert_eq!(events, vec![ProjectileEvent::AreaExited { projectile: shot, area: zone }]);
        assert!(world.component::<Projectile>(shot).unwrap().areas.is_empty());
    }

    #[test]
    fn plain_projectile_reports_hits_and_passes_through() {
        let mut world = PhysicsWorld::new();
        let mut tilemap = empty_map();
        tilemap.set_tile(tile_pos(1, 0), TileSet::GENERATED_WALL).unwrap();
        let shot = spawn_projectile(
            &mut world,
            Projectile::new(vec2(10.0, 8.0), vec2(100.0, 0.0), 5.0),
            2.0,
        );

        let events = update_projectiles(&mut world, &tilemap, 0.1);
        assert_eq!(
            events,
            vec![ProjectileEvent::Collision {
                projectile: shot,
                obstacle: Obstacle::Tile(tile_pos(1, 0)),
                normal: None,
            }]
        );
        assert_eq!(world.component::<Projectile>(shot).unwrap().position, vec2(20.0, 8.0));
    }

    #[test]
    fn bouncy_projectile_reverses_off_wall() {
        let mut world = PhysicsWorld::new();
        let mut tilemap = empty_map();
        tilemap.set_tile(tile_pos(1, 0), TileSet::GENERATED_WALL).unwrap();
        let shot = spawn_bouncy_projectile(
            &mut world,
            vec2(10.0, 8.0),
            4.0,
            vec2(100.0, 0.0),
            1.0,
            5.0,
        );

        let events = update_projectiles(&mut world, &tilemap, 0.1);
        assert_eq!(events.len(), 1);
        let state = world.component::<Projectile>(shot).unwrap();
        assert!((state.velocity.x + 100.0).abs() < 1e-3);
        assert!(state.velocity.y.abs() < 1e-3);
        // pushed back so it just touches the wall face at x=16
        assert!((state.position.x - 12.0).abs() < 1e-4);
        assert_eq!(world.collider(shot).unwrap().position, state.position);
    }

    #[test]
    fn bounciness_scales_rebound() {
        let mut world = PhysicsWorld::new();
        let tilemap = empty_map();
        world.add_collider(Collider::circle(vec2(20.0, 0.0), 4.0));
        let shot = spawn_bouncy_projectile(
            &mut world,
            vec2(10.0, 0.0),
            2.0,
            vec2(50.0, 0.0),
            0.5,
            5.0,
        );

        let events = update_projectiles(&mut world, &tilemap, 0.1);
        let ProjectileEvent::Collision { normal: Some(normal), .. } = events[0] else {
            panic!("expected a bounce, got {:?}", events);
        };
        assert!(normal.x < 0.0);
        let state = world.component::<Projectile>(shot).unwrap();
        assert!((state.velocity.x + 25.0).abs() < 1e-3);
        // resting exactly on the obstacle's surface
        assert!(((state.position - vec2(20.0, 0.0)).norm() - 6.0).abs() < 1e-4);
    }

    #[test]
    fn lifetime_expiry_kills_once() {
        let mut world = PhysicsWorld::new();
        let tilemap = empty_map();
        let shot = spawn_projectile(
            &mut world,
            Projectile::new(vec2(0.0, 0.0), vec2(0.0, 0.0), 0.25),
            1.0,
        );
        assert_eq!(projectile_count(&world), 1);

        assert!(update_projectiles(&mut world, &tilemap, 0.2).is_empty());
        let events = update_projectiles(&mut world, &tilemap, 0.2);
        assert_eq!(events, vec![ProjectileEvent::Expired { projectile: shot }]);
        assert_eq!(projectile_count(&world), 0);
        assert_eq!(world.collider_count(), 0);

        assert!(!kill_projectile(&mut world, shot));
        assert_eq!(world.collider_count(), 0);
    }

    #[test]
    fn projectiles_see_each_other_as_areas() {
        let mut world = PhysicsWorld::new();
        let tilemap = empty_map();
        let a = spawn_projectile(
            &mut world,
            Projectile::new(vec2(0.0, 0.0), vec2(0.0, 0.0), 5.0),
            3.0,
        );
        let b = spawn_projectile(
            &mut world,
            Projectile::new(vec2(4.0, 0.0), vec2(0.0, 0.0), 5.0),
            3.0,
        );

        let events = update_projectiles(&mut world, &tilemap, 0.1);
        assert_eq!(events.len(), 2);
        assert!(events.contains(&ProjectileEvent::AreaEntered { projectile: a, area: b }));
        assert!(events.contains(&ProjectileEvent::AreaEntered { projectile: b, area: a }));
    }

    #[test]
    fn rect_normal_needs_a_heading() {
        let circle = Collider::circle(vec2(18.0, 8.0), 4.0);
        let wall = Collider::rect(vec2(16.0, 0.0), vec2(16.0, 16.0));
        assert_eq!(bounce_normal(&circle, &wall, Axis::X, 10.0), Some(vec2(-6.0, 0.0)));
        assert_eq!(bounce_normal(&circle, &wall, Axis::Y, 0.0), None);
    }
}
