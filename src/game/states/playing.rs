// src/game/states/playing.rs
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use log::{debug, info, trace, warn};

use crate::config::SimConfig;
use crate::ecs::{Body, Collider, Handle, PhysicsWorld};
use crate::engine::camera::Camera;
use crate::engine::math::{tile_pos, vec2, TilePos, Vec2, VectorExt};
use crate::engine::sprite::Sprite;
use crate::engine::state::{GameState, Input};
use crate::error::Result;
use crate::game::entities::{
    physics_update, projectile_count, spawn_body, spawn_bouncy_projectile, update_projectiles,
    ProjectileEvent,
};
use crate::game::tilemap::{TileId, TileSet, Tilemap};

const PLAYER_SPEED: f32 = 96.0;       // Pixels per second
const SHOT_SPEED: f32 = 220.0;        // Initial projectile speed
const SHOT_RADIUS: f32 = 3.0;
const SHOT_LIFETIME: f32 = 1.5;       // Seconds before a shot fizzles
const SHOT_BOUNCINESS: f32 = 0.8;     // Speed kept per bounce
const MUZZLE_DISTANCE: f32 = 12.0;    // Shots start clear of the player's feet
const CAMERA_FOLLOW: f32 = 0.1;       // Fraction of the gap closed per frame

// Player feet collider, relative to the sprite's top-left corner
const FEET_OFFSET: (f32, f32) = (3.0, 10.0);
const FEET_SIZE: (f32, f32) = (10.0, 6.0);

// '#' wall, '.' floor, 'S' spawn on floor
const TEST_LEVEL: &str = "
####################
#..................#
#..................#
#....####..........#
#..................#
#.........S........#
#..................#
#......#####.......#
#..................#
####################
";

pub struct PlayingState {
    world: PhysicsWorld,
    tilemap: Tilemap,
    player: Handle,
    player_sprite: Sprite,
    facing: Vec2,
    camera_position: Vec2,
    viewport: (u32, u32),
    show_colliders: bool,
    last_events: Vec<ProjectileEvent>,
}

impl PlayingState {
    /// Builds the test level. Falls back to generated tiles if `tileset`
    /// lacks a floor or a wall type.
    pub fn new(tileset: impl Into<Arc<TileSet>>, config: &SimConfig) -> Result<Self> {
        let mut tileset: Arc<TileSet> = tileset.into();
        let (floor, wall) = match pick_tiles(&tileset) {
            Some(pair) => pair,
            None => {
                warn!("tile set has no floor/wall pair, using generated tiles");
                tileset = Arc::new(TileSet::generated(config.tile_size));
                (TileSet::GENERATED_FLOOR, TileSet::GENERATED_WALL)
            }
        };

        let legend = [('#', wall), ('.', floor), ('S', floor)];
        let tilemap = Tilemap::from_ascii(
            tileset,
            config.chunk_size,
            config.tile_size,
            TEST_LEVEL,
            &legend,
        )?;
        info!(
            "level built: {} tiles, {} floor chunks, {} wall chunks",
            tilemap.tiles().len(),
            tilemap.floor_chunks().len(),
            tilemap.wall_chunks().len()
        );

        let spawn = tilemap.tile_to_world(find_spawn(TEST_LEVEL));
        let mut world = PhysicsWorld::new();
        let feet_position = spawn + vec2(FEET_OFFSET.0, FEET_OFFSET.1);
        let feet = Collider::rect(feet_position, vec2(FEET_SIZE.0, FEET_SIZE.1))
            .visible(Rgba([0, 200, 255, 160]));
        let player = spawn_body(&mut world, spawn, feet);

        let size = config.tile_size;
        let player_sprite = Sprite::new(
            spawn,
            size as f32,
            Some(RgbaImage::from_pixel(size, size, Rgba([230, 90, 70, 255]))),
        );
        let viewport = config.viewport;

        let mut state = Self {
            world,
            tilemap,
            player,
            player_sprite,
            facing: vec2(1.0, 0.0),
            camera_position: Vec2::zeros(),
            viewport,
            show_colliders: true,
            last_events: Vec::new(),
        };
        state.camera_position = state.camera_target();
        Ok(state)
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn tilemap(&self) -> &Tilemap {
        &self.tilemap
    }

    pub fn player(&self) -> Handle {
        self.player
    }

    pub fn player_position(&self) -> Option<Vec2> {
        self.world.component::<Body>(self.player).map(|body| body.position)
    }

    /// Projectile events from the last update.
    pub fn last_events(&self) -> &[ProjectileEvent] {
        &self.last_events
    }

    // Centre of the player sprite
    fn player_center(&self) -> Vec2 {
        let half = self.tilemap.tile_size() as f32 / 2.0;
        self.player_position().unwrap_or(self.camera_position) + vec2(half, half)
    }

    fn camera_target(&self) -> Vec2 {
        self.player_center() - vec2(self.viewport.0 as f32 / 2.0, self.viewport.1 as f32 / 2.0)
    }

    // Smoothly move the camera towards the player
    fn update_camera(&mut self) {
        let target = self.camera_target();
        self.camera_position += (target - self.camera_position) * CAMERA_FOLLOW;
    }

    fn fire(&mut self) {
        let origin = self.player_center() + self.facing * MUZZLE_DISTANCE;
        let velocity = self.facing * SHOT_SPEED;
        let shot = spawn_bouncy_projectile(
            &mut self.world,
            origin,
            SHOT_RADIUS,
            velocity,
            SHOT_BOUNCINESS,
            SHOT_LIFETIME,
        );
        debug!("fired {:?}, {} shots live", shot, projectile_count(&self.world));
    }
}

impl GameState for PlayingState {
    fn handle_input(&mut self, input: &Input) -> bool {
        let direction = input.movement.normalized_or_zero();
        if direction != Vec2::zeros() {
            self.facing = direction;
        }
        if let Some(body) = self.world.component_mut::<Body>(self.player) {
            body.velocity = direction * PLAYER_SPEED;
        }
        if input.toggle_colliders {
            self.show_colliders = !self.show_colliders;
        }
        if input.fire {
            self.fire();
        }
        input.quit
    }

    fn update(&mut self, dt: f32) {
        if let Err(err) = physics_update(&mut self.world, &self.tilemap, self.player, dt) {
            warn!("player update failed: {}", err);
        }

        self.last_events = update_projectiles(&mut self.world, &self.tilemap, dt);
        for event in &self.last_events {
            trace!("{:?}", event);
        }

        if let Some(position) = self.player_position() {
            self.player_sprite.position = position;
        }
        self.update_camera();
    }

    fn draw(&mut self, frame: &mut RgbaImage) {
        let mut camera = Camera::new(self.camera_position, self.viewport);
        self.tilemap.draw(&mut camera);
        self.player_sprite.draw(&mut camera);
        if self.show_colliders {
            self.world.collide_all();
            self.world.draw_colliders(&mut camera);
        }
        camera.flush(frame);
    }
}

// First floor and first wall type in id order
fn pick_tiles(tileset: &TileSet) -> Option<(TileId, TileId)> {
    let floor = tileset.iter().find(|tile| !tile.has_collision)?.id;
    let wall = tileset.iter().find(|tile| tile.has_collision)?.id;
    Some((floor, wall))
}

// Falls back to the first interior tile when there is no 'S'
fn find_spawn(level: &str) -> TilePos {
    level
        .trim_matches('\n')
        .lines()
        .enumerate()
        .find_map(|(y, line)| line.find('S').map(|x| tile_pos(x as i32, y as i32)))
        .unwrap_or_else(|| tile_pos(1, 1))
}
