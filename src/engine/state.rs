// src/engine/state.rs
use image::{Rgba, RgbaImage};

use super::math::Vec2;

/// Input for one frame, already translated from whatever device produced it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Input {
    /// Desired movement direction. Need not be normalised.
    pub movement: Vec2,
    pub fire: bool,
    pub quit: bool,
    pub toggle_colliders: bool,
}

// GameState trait defines what all game states must implement
pub trait GameState {
    // React to this frame's input. Returns true to request exit.
    fn handle_input(&mut self, input: &Input) -> bool;

    // Update game logic
    fn update(&mut self, dt: f32);

    // Paint the current state into a frame
    fn draw(&mut self, frame: &mut RgbaImage);
}

// StateManager owns the frame buffer and the current game state
pub struct StateManager {
    current_state: Box<dyn GameState>,
    frame: RgbaImage,
    clear_color: Rgba<u8>,
}

impl StateManager {
    pub fn new(initial_state: Box<dyn GameState>, viewport: (u32, u32)) -> Self {
        Self {
            current_state: initial_state,
            frame: RgbaImage::new(viewport.0, viewport.1),
            clear_color: Rgba([40, 44, 52, 255]),
        }
    }

    pub fn handle_input(&mut self, input: &Input) -> bool {
        self.current_state.handle_input(input)
    }

    pub fn update(&mut self, dt: f32) {
        self.current_state.update(dt);
    }

    // Clear the frame and let the current state paint it
    pub fn render(&mut self) -> &RgbaImage {
        for pixel in self.frame.pixels_mut() {
            *pixel = self.clear_color;
        }
        self.current_state.draw(&mut self.frame);
        &self.frame
    }

    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }

    // Switch to a new state
    pub fn change_state(&mut self, new_state: Box<dyn GameState>) {
        self.current_state = new_state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        updates: u32,
    }

    impl GameState for Counter {
        fn handle_input(&mut self, input: &Input) -> bool {
            input.quit
        }

        fn update(&mut self, _dt: f32) {
            self.updates += 1;
        }

        fn draw(&mut self, frame: &mut RgbaImage) {
            frame.put_pixel(0, 0, Rgba([self.updates as u8, 0, 0, 255]));
        }
    }

    #[test]
    fn render_clears_then_draws_current_state() {
        let mut manager = StateManager::new(Box::new(Counter::default()), (4, 4));
        manager.update(0.1);
        manager.update(0.1);

        let frame = manager.render();
        assert_eq!(*frame.get_pixel(0, 0), Rgba([2, 0, 0, 255]));
        assert_eq!(*frame.get_pixel(3, 3), Rgba([40, 44, 52, 255]));

        manager.change_state(Box::new(Counter::default()));
        assert_eq!(manager.render().get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn quit_input_requests_exit() {
        let mut manager = StateManager::new(Box::new(Counter::default()), (1, 1));
        assert!(!manager.handle_input(&Input::default()));
        assert!(manager.handle_input(&Input {
            quit: true,
            ..Input::default()
        }));
    }
}
