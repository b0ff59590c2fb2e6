// src/engine/mod.rs
pub mod camera;
pub mod math;
pub mod sprite;
pub mod state;
pub mod timer;
