// src/ecs/components.rs
use image::Rgba;

use super::Handle;
use crate::engine::math::{vec2, Vec2};

const DEFAULT_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Geometry of a collider. Rects are anchored at their top-left corner,
/// circles at their centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Rect { size: Vec2 },
    Circle { radius: f32 },
}

// Collider component
#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    pub position: Vec2,
    pub shape: Shape,
    pub is_visible: bool,
    pub color: Rgba<u8>,
    /// Set by collision tests for drawing only. Reset every draw.
    pub is_colliding: bool,
    /// Areas report overlaps but never block movement.
    pub is_area: bool,
    /// Owning entity, if any. Does not keep the owner alive.
    pub parent: Option<Handle>,
}

impl Collider {
    fn with_shape(position: Vec2, shape: Shape) -> Self {
        Self {
            position,
            shape,
            is_visible: false,
            color: DEFAULT_COLOR,
            is_colliding: false,
            is_area: false,
            parent: None,
        }
    }

    /// Solid rectangle with its top-left corner at `position`.
    pub fn rect(position: Vec2, size: Vec2) -> Self {
        Self::with_shape(position, Shape::Rect { size })
    }

    /// Solid circle centred on `center`.
    pub fn circle(center: Vec2, radius: f32) -> Self {
        Self::with_shape(center, Shape::Circle { radius })
    }

    pub fn area(mut self) -> Self {
        self.is_area = true;
        self
    }

    pub fn visible(mut self, color: Rgba<u8>) -> Self {
        self.is_visible = true;
        self.color = color;
        self
    }

    pub fn with_parent(mut self, parent: Handle) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn is_body(&self) -> bool {
        !self.is_area
    }

    /// Axis-aligned bounding box as (top-left, bottom-right).
    pub fn bounds(&self) -> (Vec2, Vec2) {
        match self.shape {
            Shape::Rect { size } => (self.position, self.position + size),
            Shape::Circle { radius } => {
                let r = vec2(radius, radius);
                (self.position - r, self.position + r)
            }
        }
    }
}

/// Kinematic state of a moving body. Lives on the same legion entity as the
/// body's `Collider`.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub accel: Vec2,
    /// `position - collider.position`, fixed at spawn.
    pub collider_offset: Vec2,
}

impl Body {
    pub fn new(position: Vec2, collider_position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::zeros(),
            accel: Vec2::zeros(),
            collider_offset: position - collider_position,
        }
    }
}
