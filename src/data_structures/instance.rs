//! Placement of a mesh in the world.
//!
//! Board pieces are positioned by composing a few of these: the world offset,
//! the board offset, the cell anchor and a per-tier correction.

use std::ops::Mul;

use cgmath::{One, Rotation3};

/// Position, rotation (as quaternion) and scale of one drawn mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Create a new instance with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        cgmath::Vector3::new(x, y, z).into()
    }

    pub fn rotation_x(angle: cgmath::Deg<f32>) -> Self {
        Self {
            rotation: cgmath::Quaternion::from_angle_x(angle),
            ..Default::default()
        }
    }

    pub fn uniform_scale(factor: f32) -> Self {
        Self {
            scale: cgmath::Vector3::new(factor, factor, factor),
            ..Default::default()
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

/// `parent * child` applies `child` inside the frame of `parent`.
impl<'a, 'b> Mul<&'b Instance> for &'a Instance {
    type Output = Instance;

    fn mul(self, rhs: &'b Instance) -> Self::Output {
        let new_rotation = self.rotation * rhs.rotation;

        let new_scale = cgmath::Vector3::new(
            self.scale.x * rhs.scale.x,
            self.scale.y * rhs.scale.y,
            self.scale.z * rhs.scale.z,
        );
        let scaled_rhs_pos = cgmath::Vector3::new(
            self.scale.x * rhs.position.x,
            self.scale.y * rhs.position.y,
            self.scale.z * rhs.position.z,
        );
        let new_position = self.position + (self.rotation * scaled_rhs_pos);

        Instance {
            position: new_position,
            rotation: new_rotation,
            scale: new_scale,
        }
    }
}

impl Mul<Instance> for Instance {
    type Output = Self;

    fn mul(self, rhs: Instance) -> Self::Output {
        &self * &rhs
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Deg, InnerSpace, Vector4};

    use super::*;

    #[test]
    fn composition_matches_matrix_product() {
        let parent = Instance::translation(1.0, 2.0, 3.0) * Instance::uniform_scale(2.0);
        let child = Instance::translation(5.0, 0.0, 0.0);
        let composed = (parent * child).to_matrix();
        let expected = parent.to_matrix() * child.to_matrix();
        let p = Vector4::new(1.0, 1.0, 1.0, 1.0);
        assert!((composed * p - expected * p).magnitude() < 1e-5);
        assert_eq!((parent * child).position, cgmath::Vector3::new(11.0, 2.0, 3.0));
    }

    #[test]
    fn rotation_x_turns_z_up_into_y_up() {
        let m = Instance::rotation_x(Deg(-90.0)).to_matrix();
        let up = m * Vector4::new(0.0, 0.0, 1.0, 0.0);
        assert!((up - Vector4::new(0.0, 1.0, 0.0, 0.0)).magnitude() < 1e-5);
    }
}
