use std::env;
use std::thread;
use std::time::Duration;

use log::{info, warn};

use imora::engine::math::vec2;
use imora::engine::state::{Input, StateManager};
use imora::engine::timer::Timer;
use imora::game::states::playing::PlayingState;
use imora::game::tilemap::TileSet;
use imora::SimConfig;

const DEMO_FRAMES: u32 = 180;
const FRAME_TIME: Duration = Duration::from_millis(16);

// Scripted stand-in for keyboard polling
fn scripted_input(frame: u32) -> Input {
    let movement = match frame {
        0..=44 => vec2(1.0, 0.0),
        45..=89 => vec2(0.0, 1.0),
        90..=134 => vec2(-1.0, -1.0),
        _ => vec2(0.0, 0.0),
    };
    Input {
        movement,
        fire: frame % 30 == 15,
        quit: frame + 1 == DEMO_FRAMES,
        toggle_colliders: false,
    }
}

// Usage: imora [config.json] [last_frame.png]
fn main() -> imora::Result<()> {
    let _ = env_logger::Builder::from_default_env().try_init();

    let args: Vec<String> = env::args().collect();
    let config = match args.get(1) {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    let mut tileset = TileSet::load_dir(&config.tile_dir, config.tile_size);
    if tileset.is_empty() {
        warn!("no tiles in {}, using generated tiles", config.tile_dir.display());
        tileset = TileSet::generated(config.tile_size);
    }

    let playing_state = Box::new(PlayingState::new(tileset, &config)?);
    let mut state_manager = StateManager::new(playing_state, config.viewport);

    // Create a timer for calculating delta time
    let mut timer = Timer::with_max_delta(config.max_delta);
    let mut frame = 0;
    loop {
        if state_manager.handle_input(&scripted_input(frame)) {
            info!("quit requested after {} frames", frame + 1);
            break;
        }
        state_manager.update(timer.delta());
        state_manager.render();

        frame += 1;
        thread::sleep(FRAME_TIME);
    }

    if let Some(path) = args.get(2) {
        state_manager.render().save(path)?;
        info!("last frame written to {}", path);
    }
    Ok(())
}
