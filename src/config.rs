// src/config.rs
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::timer::DEFAULT_MAX_DELTA;
use crate::error::{Error, Result};

/// Simulation settings. Every field is optional in the JSON file and falls
/// back to its default.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    /// Tile edge in pixels.
    pub tile_size: u32,
    /// Chunk edge in tiles.
    pub chunk_size: u32,
    /// Directory of tile sheets, one 4x4 sheet per tile type.
    pub tile_dir: PathBuf,
    /// Longest step the frame driver will simulate, in seconds.
    pub max_delta: f32,
    pub viewport: (u32, u32),
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tile_size: 16,
            chunk_size: 8,
            tile_dir: PathBuf::from("Images/Tiles"),
            max_delta: DEFAULT_MAX_DELTA,
            viewport: (640, 360),
        }
    }
}

impl SimConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(Error::InvalidConfig("tile_size must be positive".into()));
        }
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be positive".into()));
        }
        if self.max_delta.is_nan() || self.max_delta <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "max_delta must be positive, got {}",
                self.max_delta
            )));
        }
        if self.viewport.0 == 0 || self.viewport.1 == 0 {
            return Err(Error::InvalidConfig("viewport must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: SimConfig = serde_json::from_str(r#"{ "tile_size": 32 }"#).unwrap();
        assert_eq!(config.tile_size, 32);
        assert_eq!(config.chunk_size, 8);
        assert_eq!(config.tile_dir, PathBuf::from("Images/Tiles"));
        assert_eq!(config.max_delta, 0.5);
    }

    #[test]
    fn validation_rejects_zero_sizes() {
        let config = SimConfig {
            chunk_size: 0,
            ..SimConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = SimConfig {
            max_delta: f32::NAN,
            ..SimConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn load_reads_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "chunk_size": 4, "viewport": [320, 180] }}"#).unwrap();

        let config = SimConfig::load(file.path()).unwrap();
        assert_eq!(config.chunk_size, 4);
        assert_eq!(config.viewport, (320, 180));
    }
}
