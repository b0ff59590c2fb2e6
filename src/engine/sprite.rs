// src/engine/sprite.rs
use std::borrow::Cow;

use image::RgbaImage;

use super::camera::Camera;
use super::math::Vec2;

/// A static image drawn into the depth-sorted layer. `y_offset` moves its
/// sort key, usually to the sprite's feet.
pub struct Sprite {
    pub image: Option<RgbaImage>,
    pub position: Vec2,
    pub y_offset: f32,
}

impl Sprite {
    pub fn new(position: Vec2, y_offset: f32, image: Option<RgbaImage>) -> Self {
        Self {
            image,
            position,
            y_offset,
        }
    }

    pub fn draw<'a>(&'a self, camera: &mut Camera<'a>) {
        // A sprite whose image failed to load just isn't drawn
        let Some(image) = &self.image else {
            return;
        };
        camera.add_to_sorted(Cow::Borrowed(image), self.position.x, self.position.y, self.y_offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::math::vec2;

    #[test]
    fn sprite_without_image_queues_nothing() {
        let missing = Sprite::new(vec2(4.0, 4.0), 8.0, None);
        let loaded = Sprite::new(vec2(4.0, 4.0), 8.0, Some(RgbaImage::new(2, 2)));
        let mut camera = Camera::new(vec2(0.0, 0.0), (16, 16));

        missing.draw(&mut camera);
        assert_eq!(camera.queued(), 0);

        loaded.draw(&mut camera);
        assert_eq!(camera.queued(), 1);
    }
}
