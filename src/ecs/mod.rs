// src/ecs/mod.rs
pub mod collision;
pub mod components;
pub mod world;

/// Stable id of a registered collider and whatever owns it.
pub type Handle = legion::Entity;

pub use collision::{intersects, TileContact};
pub use components::{Body, Collider, Shape};
pub use world::{CollisionFilter, PhysicsWorld};
