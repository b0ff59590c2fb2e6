// src/engine/math.rs
use nalgebra as na;

/// World-space position or direction, in pixels.
pub type Vec2 = na::Vector2<f32>;

/// Integer tile or chunk coordinate. Used as a map key.
pub type TilePos = na::Vector2<i32>;

// Components closer than this to an integer are snapped by `corrected`
const SNAP_EPSILON: f32 = 0.0001;

pub fn vec2(x: f32, y: f32) -> Vec2 {
    Vec2::new(x, y)
}

pub fn tile_pos(x: i32, y: i32) -> TilePos {
    TilePos::new(x, y)
}

/// One of the two movement axes. Movement is resolved one axis at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub const BOTH: [Axis; 2] = [Axis::X, Axis::Y];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
        }
    }

    pub fn other(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }

    /// Unit vector along this axis.
    pub fn unit(self) -> Vec2 {
        match self {
            Axis::X => vec2(1.0, 0.0),
            Axis::Y => vec2(0.0, 1.0),
        }
    }
}

/// Game-specific helpers on top of nalgebra's vector.
pub trait VectorExt: Sized {
    /// Snaps components lying within `1e-4` of an integer onto that integer,
    /// so repeated additions don't accumulate drift.
    fn corrected(&self) -> Self;

    /// Unit vector in the same direction, or zero for a zero-length vector.
    fn normalized_or_zero(&self) -> Self;

    /// Reflects this vector about `normal`. `normal` need not be unit length;
    /// a zero normal leaves the vector unchanged.
    fn reflect(&self, normal: &Self) -> Self;

    /// Component-wise floor.
    fn truncated(&self) -> Self;

    /// Vector of length `magnitude` pointing from `origin` towards `target`.
    fn vector_to(origin: &Self, target: &Self, magnitude: f32) -> Self;
}

fn snap(value: f32) -> f32 {
    let rounded = value.round();
    if (rounded - value).abs() < SNAP_EPSILON {
        rounded
    } else {
        value
    }
}

impl VectorExt for Vec2 {
    fn corrected(&self) -> Self {
        vec2(snap(self.x), snap(self.y))
    }

    fn normalized_or_zero(&self) -> Self {
        let length = self.norm();
        if length == 0.0 {
            Vec2::zeros()
        } else {
            *self / length
        }
    }

    fn reflect(&self, normal: &Self) -> Self {
        let n = normal.normalized_or_zero();
        *self - n * (2.0 * self.dot(&n))
    }

    fn truncated(&self) -> Self {
        vec2(self.x.floor(), self.y.floor())
    }

    fn vector_to(origin: &Self, target: &Self, magnitude: f32) -> Self {
        (*target - *origin).normalized_or_zero() * magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrected_snaps_near_integers_only() {
        let v = vec2(2.99995, 1.5).corrected();
        assert_eq!(v, vec2(3.0, 1.5));

        let v = vec2(-4.00004, 0.2).corrected();
        assert_eq!(v, vec2(-4.0, 0.2));
    }

    #[test]
    fn zero_vector_normalizes_to_zero() {
        assert_eq!(Vec2::zeros().normalized_or_zero(), Vec2::zeros());
        assert_eq!(vec2(0.0, -3.0).normalized_or_zero(), vec2(0.0, -1.0));
    }

    #[test]
    fn reflect_reverses_component_along_normal() {
        let v = vec2(100.0, 20.0);
        let r = v.reflect(&vec2(-4.0, 0.0));
        assert!((r.x + 100.0).abs() < 1e-4);
        assert!((r.y - 20.0).abs() < 1e-4);
        assert!((r.norm() - v.norm()).abs() < 1e-3);

        // zero normal is a no-op
        assert_eq!(v.reflect(&Vec2::zeros()), v);
    }

    #[test]
    fn vector_to_has_requested_length() {
        let v = Vec2::vector_to(&vec2(1.0, 1.0), &vec2(4.0, 5.0), 10.0);
        assert!((v.norm() - 10.0).abs() < 1e-4);
        assert_eq!(Vec2::vector_to(&vec2(1.0, 1.0), &vec2(1.0, 1.0), 3.0), Vec2::zeros());
    }

    #[test]
    fn axis_indexes_vector_components() {
        let mut v = vec2(1.0, 2.0);
        v[Axis::Y.index()] += 3.0;
        assert_eq!(v, vec2(1.0, 5.0));
        assert_eq!(Axis::X.other(), Axis::Y);
    }
}
