use glam::{Mat4, Vec3, Vec4};

use crate::config::CameraConfig;

/// Perspective camera sitting just off the panorama centre and looking at its
/// interest point. Orbit controls move `position`; everything else is fixed
/// unless zoom adjusts the field of view.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub interest: Vec3,
    pub up: Vec3,
    pub fov_degrees: f32,
    pub near_clip: f32,
    pub far_clip: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl Camera {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, config.distance),
            interest: Vec3::ZERO,
            up: Vec3::Y,
            fov_degrees: config.fov_degrees,
            near_clip: config.near_clip,
            far_clip: config.far_clip,
        }
    }

    /// Unit view direction. Falls back to -Z when eye and interest coincide.
    pub fn forward(&self) -> Vec3 {
        (self.interest - self.position)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        let forward = self.forward();
        let mut up = self.up.try_normalize().unwrap_or(Vec3::Y);
        if forward.cross(up).length_squared() <= f32::EPSILON {
            up = if forward.z.abs() < 0.9 { Vec3::Z } else { Vec3::X };
        }
        Mat4::look_to_rh(self.position, forward, up)
    }

    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        let near = self.near_clip.max(1e-4);
        Mat4::perspective_rh(
            self.fov_degrees.clamp(1.0, 179.0).to_radians(),
            aspect_ratio,
            near,
            self.far_clip.max(near + 1.0),
        )
    }

    pub fn projector(&self, aspect_ratio: f32) -> Option<CameraProjector> {
        if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
            return None;
        }
        Some(CameraProjector {
            view_projection: self.projection_matrix(aspect_ratio) * self.view_matrix(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraProjector {
    view_projection: Mat4,
}

impl CameraProjector {
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.view_projection
    }

    pub fn clip(&self, position: Vec3) -> Vec4 {
        self.view_projection * position.extend(1.0)
    }
}
