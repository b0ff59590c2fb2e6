// src/engine/camera.rs
use std::borrow::Cow;

use image::{Pixel, RgbaImage};

use super::math::{vec2, Vec2};

/// Anything that can paint an image at a screen offset.
pub trait Canvas {
    fn draw_image(&mut self, image: &RgbaImage, x: i32, y: i32);
}

/// Copies `src` onto `dest` with its top-left at (x, y), clipped to `dest`.
/// Opaque pixels are copied as-is, translucent ones alpha-blended.
pub fn blit(dest: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64) {
    let (width, height) = (dest.width() as i64, dest.height() as i64);
    for (sx, sy, pixel) in src.enumerate_pixels() {
        let dx = x + sx as i64;
        let dy = y + sy as i64;
        if dx < 0 || dy < 0 || dx >= width || dy >= height {
            continue;
        }
        match pixel[3] {
            0 => {}
            255 => dest.put_pixel(dx as u32, dy as u32, *pixel),
            _ => dest.get_pixel_mut(dx as u32, dy as u32).blend(pixel),
        }
    }
}

// Software canvas: paints straight into a frame buffer
impl Canvas for RgbaImage {
    fn draw_image(&mut self, image: &RgbaImage, x: i32, y: i32) {
        blit(self, image, x as i64, y as i64);
    }
}

/// A queued draw request. Chunk images are borrowed for the frame; transient
/// images (collider outlines and such) are owned.
pub struct Drawable<'a> {
    pub image: Cow<'a, RgbaImage>,
    pub x: i32,
    pub y: i32,
    pub y_offset: i32,
}

impl<'a> Drawable<'a> {
    fn new(image: Cow<'a, RgbaImage>, x: f32, y: f32, y_offset: f32) -> Self {
        Self {
            image,
            x: x.floor() as i32,
            y: y.floor() as i32,
            y_offset: y_offset.floor() as i32,
        }
    }

    fn depth(&self) -> i32 {
        self.y + self.y_offset
    }
}

/// Per-frame draw queue with three layers: unsorted (floors), depth-sorted
/// (walls, sprites) and overlays. Flushing paints them in that order and
/// empties the queue.
pub struct Camera<'a> {
    x: i32,
    y: i32,
    viewport: (u32, u32),
    unsorted: Vec<Drawable<'a>>,
    sorted: Vec<Drawable<'a>>,
    overlays: Vec<Drawable<'a>>,
}

impl<'a> Camera<'a> {
    pub fn new(position: Vec2, viewport: (u32, u32)) -> Self {
        Self {
            x: position.x.floor() as i32,
            y: position.y.floor() as i32,
            viewport,
            unsorted: Vec::new(),
            sorted: Vec::new(),
            overlays: Vec::new(),
        }
    }

    pub fn position(&self) -> Vec2 {
        vec2(self.x as f32, self.y as f32)
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.x = position.x.floor() as i32;
        self.y = position.y.floor() as i32;
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// World-space rectangle currently in view, as (top-left, bottom-right).
    pub fn view_bounds(&self) -> (Vec2, Vec2) {
        let min = self.position();
        let max = min + vec2(self.viewport.0 as f32, self.viewport.1 as f32);
        (min, max)
    }

    pub fn world_to_screen(&self, point: Vec2) -> Vec2 {
        point - self.position()
    }

    pub fn screen_to_world(&self, point: Vec2) -> Vec2 {
        point + self.position()
    }

    pub fn add_to_unsorted(&mut self, image: Cow<'a, RgbaImage>, x: f32, y: f32) {
        self.unsorted.push(Drawable::new(image, x, y, 0.0));
    }

    /// Queues an image drawn in order of `y + y_offset`. Equal depths keep
    /// insertion order.
    pub fn add_to_sorted(&mut self, image: Cow<'a, RgbaImage>, x: f32, y: f32, y_offset: f32) {
        self.sorted.push(Drawable::new(image, x, y, y_offset));
    }

    pub fn add_to_overlay(&mut self, image: Cow<'a, RgbaImage>, x: f32, y: f32) {
        self.overlays.push(Drawable::new(image, x, y, 0.0));
    }

    pub fn queued(&self) -> usize {
        self.unsorted.len() + self.sorted.len() + self.overlays.len()
    }

    /// Paints every queued image onto `canvas` and clears the queue.
    pub fn flush(&mut self, canvas: &mut dyn Canvas) {
        // sort_by_key is stable, later ties stay on top
        self.sorted.sort_by_key(Drawable::depth);

        let (cx, cy) = (self.x, self.y);
        for drawable in self
            .unsorted
            .drain(..)
            .chain(self.sorted.drain(..))
            .chain(self.overlays.drain(..))
        {
            canvas.draw_image(&drawable.image, drawable.x - cx, drawable.y - cy);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    struct Recorder(Vec<(u8, i32, i32)>);

    impl Canvas for Recorder {
        fn draw_image(&mut self, image: &RgbaImage, x: i32, y: i32) {
            self.0.push((image.get_pixel(0, 0)[0], x, y));
        }
    }

    fn marker(tag: u8) -> RgbaImage {
        RgbaImage::from_pixel(1, 1, Rgba([tag, 0, 0, 255]))
    }

    #[test]
    fn sorted_layer_orders_by_depth_and_keeps_ties_stable() {
        let mut camera = Camera::new(vec2(0.0, 0.0), (64, 64));
        camera.add_to_sorted(Cow::Owned(marker(1)), 0.0, 20.0, 0.0);
        camera.add_to_sorted(Cow::Owned(marker(2)), 0.0, 5.0, 10.0);
        camera.add_to_sorted(Cow::Owned(marker(3)), 0.0, 10.0, 5.0);
        camera.add_to_unsorted(Cow::Owned(marker(4)), 0.0, 99.0);
        camera.add_to_overlay(Cow::Owned(marker(5)), 0.0, 0.0);

        let mut recorder = Recorder(Vec::new());
        camera.flush(&mut recorder);

        let order: Vec<u8> = recorder.0.iter().map(|(tag, _, _)| *tag).collect();
        assert_eq!(order, vec![4, 2, 3, 1, 5]);
        assert_eq!(camera.queued(), 0);
    }

    #[test]
    fn flush_offsets_by_camera_position() {
        let image = marker(7);
        let mut camera = Camera::new(vec2(10.7, -3.2), (32, 32));
        camera.add_to_unsorted(Cow::Borrowed(&image), 15.0, 0.0);

        let mut recorder = Recorder(Vec::new());
        camera.flush(&mut recorder);
        assert_eq!(recorder.0, vec![(7, 5, 4)]);
    }

    #[test]
    fn blit_clips_and_skips_transparent_pixels() {
        let mut dest = RgbaImage::from_pixel(3, 3, Rgba([9, 9, 9, 255]));
        let mut src = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]));
        src.put_pixel(0, 0, Rgba([0, 0, 0, 0]));

        blit(&mut dest, &src, 2, -1);
        assert_eq!(*dest.get_pixel(2, 0), Rgba([1, 2, 3, 255]));
        assert_eq!(*dest.get_pixel(1, 0), Rgba([9, 9, 9, 255]));

        blit(&mut dest, &src, 0, 0);
        assert_eq!(*dest.get_pixel(0, 0), Rgba([9, 9, 9, 255]));
        assert_eq!(*dest.get_pixel(1, 1), Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn screen_and_world_transforms_are_inverse() {
        let camera = Camera::new(vec2(32.0, 48.0), (320, 180));
        let p = vec2(3.5, 7.25);
        assert_eq!(camera.screen_to_world(camera.world_to_screen(p)), p);
        assert_eq!(camera.world_to_screen(vec2(32.0, 48.0)), vec2(0.0, 0.0));
    }

    #[test]
    fn rgba_canvas_blends_image_at_offset() {
        let mut frame = RgbaImage::new(4, 4);
        let mut camera = Camera::new(vec2(0.0, 0.0), (4, 4));
        camera.add_to_unsorted(Cow::Owned(marker(200)), 2.0, 1.0);
        camera.flush(&mut frame);
        assert_eq!(frame.get_pixel(2, 1)[0], 200);
        assert_eq!(frame.get_pixel(0, 0)[3], 0);
    }
}
