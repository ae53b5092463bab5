//! Camera for 3D rendering

use crate::core::types::{Mat4, Quat, Vec3};

/// Camera with position, rotation, and projection parameters
#[derive(Clone, Debug)]
pub struct Camera {
    /// World position (relative to the scene node the camera is mounted on)
    pub position: Vec3,
    /// Rotation as quaternion
    pub rotation: Quat,
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
}

impl Camera {
    /// Create a new camera
    pub fn new(position: Vec3, fov_y_degrees: f32, aspect: f32) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            fov_y: fov_y_degrees.to_radians(),
            aspect,
            near: 0.01,
            far: 100_000.0,
        }
    }

    /// Create camera looking at a target
    pub fn look_at(position: Vec3, target: Vec3, up: Vec3) -> Self {
        let forward = (target - position).normalize();
        let right = forward.cross(up).normalize();
        let up = right.cross(forward);

        let rotation = Quat::from_mat3(&glam::Mat3::from_cols(right, up, -forward));

        Self {
            position,
            rotation,
            fov_y: 60.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.01,
            far: 100_000.0,
        }
    }

    /// Get the camera pose as a matrix (camera space to mount space)
    pub fn pose_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }

    /// Horizontal field of view in radians, derived from fov_y and aspect
    pub fn fov_x(&self) -> f32 {
        2.0 * ((self.fov_y * 0.5).tan() * self.aspect).atan()
    }

    /// Get forward direction (negative Z in camera space)
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }

    /// Get up direction (positive Y in camera space)
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}
