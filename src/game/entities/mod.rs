// src/game/entities/mod.rs
pub mod entity;
pub mod projectile;

pub use entity::{despawn_body, move_and_collide, physics_update, spawn_body, MoveOutcome};
pub use projectile::{
    kill_projectile, projectile_count, spawn_bouncy_projectile, spawn_projectile,
    update_projectiles, Obstacle, Projectile, ProjectileEvent, ProjectileKind,
};
