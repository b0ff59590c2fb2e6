// src/game/mod.rs
pub mod entities;
pub mod states;
pub mod tilemap;
