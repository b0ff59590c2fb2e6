// src/lib.rs
//! Simulation core of a 2D tile game: chunked autotiled tilemaps, rect and
//! circle colliders, and axis-separated movement for bodies and projectiles.

pub mod config;
pub mod ecs;
pub mod engine;
pub mod error;
pub mod game;
pub mod levels;

pub use config::SimConfig;
pub use error::{Error, Result};
