//! Math utilities and types
//!
//! Vector aliases and the plain transforms carried by spatial nodes.

pub use nalgebra::{Vector2, Vector3};

/// 2D vector type
pub type Vec2 = Vector2<f64>;

/// 3D vector type
pub type Vec3 = Vector3<f64>;

/// Position, scale and rotation of a node in the plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    /// Position in 2D space
    pub position: Vec2,

    /// Scale factors
    pub scale: Vec2,

    /// Rotation in radians
    pub rotation: f64,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            position: Vec2::zeros(),
            scale: Vec2::new(1.0, 1.0),
            rotation: 0.0,
        }
    }
}

impl Transform2D {
    /// Create a transform with only position
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Position rounded to the nearest integer cell
    pub fn snapped_position(&self) -> (i32, i32) {
        (round_to_i32(self.position.x), round_to_i32(self.position.y))
    }
}

/// Position, scale and rotation of a node in space
///
/// Rotation is stored as yaw/pitch in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform3D {
    /// Position in 3D space
    pub position: Vec3,

    /// Scale factors
    pub scale: Vec3,

    /// Yaw and pitch in radians
    pub rotation: Vec2,
}

impl Default for Transform3D {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            rotation: Vec2::zeros(),
        }
    }
}

/// Round to the nearest integer, saturating at the `i32` range
#[allow(clippy::cast_possible_truncation)]
pub fn round_to_i32(value: f64) -> i32 {
    value.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_transform_has_unit_scale() {
        let transform = Transform2D::default();
        assert_eq!(transform.position, Vec2::zeros());
        assert_eq!(transform.scale, Vec2::new(1.0, 1.0));
        assert_eq!(transform.rotation, 0.0);

        let transform = Transform3D::default();
        assert_eq!(transform.scale, Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_snapped_position_rounds() {
        let transform = Transform2D::from_position(Vec2::new(2.4, 2.6));
        assert_eq!(transform.snapped_position(), (2, 3));

        let transform = Transform2D::from_position(Vec2::new(-1.6, 1e20));
        assert_eq!(transform.snapped_position(), (-2, i32::MAX));
    }
}
