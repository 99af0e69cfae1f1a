//! Math utilities and types
//!
//! Thin aliases over nalgebra plus the [`Transformation`] triple the scene
//! graph composes into world matrices.

pub use nalgebra::{Matrix4, Rotation3, Vector2, Vector3, Vector4};

use serde::{Deserialize, Serialize};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Translation, euler rotation (radians, applied X then Y then Z) and scale.
///
/// This is the source of truth for an entity's placement; matrices are
/// always derived from it and never stored back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    /// Offset from the parent origin
    pub translation: Vec3,
    /// Euler angles in radians (roll, pitch, yaw)
    pub rotation: Vec3,
    /// Per-axis scale factors
    pub scale: Vec3,
}

impl Default for Transformation {
    fn default() -> Self {
        Self {
            translation: Vec3::zeros(),
            rotation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transformation {
    /// Identity transformation
    pub fn identity() -> Self {
        Self::default()
    }

    /// Transformation with only a translation
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    /// Builder: replace the translation
    pub fn with_translation(mut self, x: f32, y: f32, z: f32) -> Self {
        self.translation = Vec3::new(x, y, z);
        self
    }

    /// Builder: replace the euler rotation
    pub fn with_rotation(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = Vec3::new(x, y, z);
        self
    }

    /// Builder: replace the scale
    pub fn with_scale(mut self, x: f32, y: f32, z: f32) -> Self {
        self.scale = Vec3::new(x, y, z);
        self
    }

    /// Add to the current translation
    pub fn translate(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.translation += Vec3::new(x, y, z);
        self
    }

    /// Add to the current euler rotation
    pub fn rotate(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.rotation += Vec3::new(x, y, z);
        self
    }

    /// Multiply the current scale per axis
    pub fn scale_by(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.scale.component_mul_assign(&Vec3::new(x, y, z));
        self
    }

    /// Local matrix, `T * R * S`
    pub fn to_matrix(&self) -> Mat4 {
        let rotation =
            Rotation3::from_euler_angles(self.rotation.x, self.rotation.y, self.rotation.z);
        Mat4::new_translation(&self.translation)
            * rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Component-wise interpolation between two transformations
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            translation: self.translation.lerp(&other.translation, t),
            rotation: self.rotation.lerp(&other.rotation, t),
            scale: self.scale.lerp(&other.scale, t),
        }
    }
}

/// Axis-aligned rectangle in world units, used for entity bounds
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Minimum corner
    pub min: Vec2,
    /// Maximum corner
    pub max: Vec2,
}

impl Rect {
    /// Bounds of the unit quad `[-1, 1]²` after applying `matrix`
    pub fn from_unit_quad(matrix: &Mat4) -> Self {
        let corners = [
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 1.0, 0.0),
        ];
        let mut min = Vec2::new(f32::MAX, f32::MAX);
        let mut max = Vec2::new(f32::MIN, f32::MIN);
        for corner in &corners {
            let p = matrix.transform_point(corner);
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Self { min, max }
    }

    /// Width and height
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Whether `point` lies inside (edges inclusive)
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_matrix() {
        assert_relative_eq!(Transformation::identity().to_matrix(), Mat4::identity());
    }

    #[test]
    fn test_trs_order() {
        let t = Transformation::identity()
            .with_translation(5.0, 0.0, 0.0)
            .with_scale(2.0, 2.0, 2.0);
        let p = t.to_matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        // scale happens before translation
        assert_relative_eq!(p, Point3::new(7.0, 0.0, 0.0));
    }

    #[test]
    fn test_rotation_about_z() {
        let t = Transformation::identity().with_rotation(0.0, 0.0, constants::HALF_PI);
        let p = t.to_matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(0.0, 1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_lerp_midpoint() {
        let a = Transformation::identity();
        let b = Transformation::identity().with_translation(10.0, -4.0, 2.0);
        let mid = a.lerp(&b, 0.5);
        assert_relative_eq!(mid.translation, Vec3::new(5.0, -2.0, 1.0));
        assert_relative_eq!(mid.scale, Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_unit_quad_bounds() {
        let t = Transformation::identity()
            .with_translation(1.0, 1.0, 0.0)
            .with_scale(2.0, 0.5, 1.0);
        let bounds = Rect::from_unit_quad(&t.to_matrix());
        assert_relative_eq!(bounds.min, Vec2::new(-1.0, 0.5));
        assert_relative_eq!(bounds.max, Vec2::new(3.0, 1.5));
        assert!(bounds.contains(Vec2::new(0.0, 1.0)));
        assert!(!bounds.contains(Vec2::new(0.0, 2.0)));
    }
}
