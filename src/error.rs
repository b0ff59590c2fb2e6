// src/error.rs
use std::io;

use thiserror::Error;

use crate::ecs::Handle;
use crate::game::tilemap::TileId;

/// Errors raised by the simulation core.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("image: {0}")]
    Image(#[from] image::ImageError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// Tile id not present in the tile set.
    #[error("unknown tile id {0}")]
    UnknownTile(TileId),

    /// The handle is dead or does not carry the expected component.
    #[error("entity {handle:?} has no {component} component")]
    MissingComponent {
        handle: Handle,
        component: &'static str,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
