//! Camera projection
//!
//! The perspective projection follows the viewport: every accepted resize
//! hands the new aspect ratio to [`Camera::set_aspect_ratio`].

use glam::Mat4;

/// Perspective parameters used to build the projection matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub fov_y_radians: f32,
    /// Width divided by height
    pub aspect_ratio: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Default for Camera {
    /// 60 degree camera with the aspect ratio a fresh viewport reports
    fn default() -> Self {
        Self::perspective(60.0, 1.0, 0.1, 1000.0)
    }
}

impl Camera {
    pub fn perspective(fov_y_degrees: f32, aspect_ratio: f32, z_near: f32, z_far: f32) -> Self {
        Self {
            fov_y_radians: fov_y_degrees.to_radians(),
            aspect_ratio,
            z_near,
            z_far,
        }
    }

    /// Right-handed perspective projection for the current aspect ratio
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_radians, self.aspect_ratio, self.z_near, self.z_far)
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }
}
