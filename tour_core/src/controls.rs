//! Orbit-style camera controls for looking around inside the panorama. The
//! camera orbits the interest point at a small fixed distance, so dragging
//! reads as turning the head; zoom narrows the field of view instead of moving
//! the eye, which would otherwise push it towards the sphere wall.

use std::f32::consts::PI;

use glam::Vec3;

use crate::camera::Camera;
use crate::config::{CameraConfig, ControlsConfig};

const POLAR_MARGIN: f32 = 1e-3;
const MIN_DRAG_HEIGHT: f32 = 1.0;

/// Anything that advances the camera once per frame.
pub trait CameraControl {
    fn update(&mut self, camera: &mut Camera, dt: f32);
}

#[derive(Debug, Clone)]
pub struct OrbitControls {
    config: ControlsConfig,
    distance: f32,
    azimuth: f32,
    polar: f32,
    azimuth_delta: f32,
    polar_delta: f32,
    zoom_delta: f32,
    drag_anchor: Option<(f32, f32)>,
    viewport_height: f32,
    auto_rotate: bool,
}

impl OrbitControls {
    /// Starts looking down -Z, matching `Camera::from_config`.
    pub fn new(controls: &ControlsConfig, camera: &CameraConfig) -> Self {
        Self {
            config: controls.clone(),
            distance: camera.distance.max(1e-4),
            azimuth: 0.0,
            polar: PI * 0.5,
            azimuth_delta: 0.0,
            polar_delta: 0.0,
            zoom_delta: 0.0,
            drag_anchor: None,
            viewport_height: 720.0,
            auto_rotate: controls.auto_rotate,
        }
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    pub fn polar(&self) -> f32 {
        self.polar
    }

    pub fn auto_rotate(&self) -> bool {
        self.auto_rotate
    }

    pub fn set_auto_rotate(&mut self, enabled: bool) {
        self.auto_rotate = enabled;
    }

    pub fn toggle_auto_rotate(&mut self) -> bool {
        self.auto_rotate = !self.auto_rotate;
        self.auto_rotate
    }

    pub fn set_viewport_height(&mut self, height: f32) {
        self.viewport_height = height.max(MIN_DRAG_HEIGHT);
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    pub fn begin_drag(&mut self, x: f32, y: f32) {
        self.drag_anchor = Some((x, y));
    }

    pub fn drag_to(&mut self, x: f32, y: f32) {
        let Some((last_x, last_y)) = self.drag_anchor else {
            return;
        };
        let scale = 2.0 * PI * self.config.rotate_speed / self.viewport_height;
        self.azimuth_delta -= (x - last_x) * scale;
        self.polar_delta -= (y - last_y) * scale;
        self.drag_anchor = Some((x, y));
    }

    pub fn end_drag(&mut self) {
        self.drag_anchor = None;
    }

    /// Positive `steps` zoom in (narrower field of view).
    pub fn zoom(&mut self, steps: f32) {
        if steps.is_finite() {
            self.zoom_delta -= steps * self.config.zoom_step_degrees;
        }
    }

    fn auto_rotation_angle(&self, dt: f32) -> f32 {
        // One revolution per 60 seconds at speed 1.
        2.0 * PI / 60.0 * self.config.auto_rotate_speed * dt
    }

    fn offset(&self) -> Vec3 {
        let sin_polar = self.polar.sin();
        Vec3::new(
            self.distance * sin_polar * self.azimuth.sin(),
            self.distance * self.polar.cos(),
            self.distance * sin_polar * self.azimuth.cos(),
        )
    }
}

impl CameraControl for OrbitControls {
    fn update(&mut self, camera: &mut Camera, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        if self.auto_rotate && !self.is_dragging() {
            self.azimuth_delta -= self.auto_rotation_angle(dt);
        }

        let damping = self.config.damping;
        if damping > 0.0 {
            self.azimuth += self.azimuth_delta * damping;
            self.polar += self.polar_delta * damping;
            self.azimuth_delta *= 1.0 - damping;
            self.polar_delta *= 1.0 - damping;
        } else {
            self.azimuth += self.azimuth_delta;
            self.polar += self.polar_delta;
            self.azimuth_delta = 0.0;
            self.polar_delta = 0.0;
        }
        self.azimuth = self.azimuth.rem_euclid(2.0 * PI);
        self.polar = self.polar.clamp(POLAR_MARGIN, PI - POLAR_MARGIN);

        if self.zoom_delta != 0.0 {
            camera.fov_degrees = (camera.fov_degrees + self.zoom_delta)
                .clamp(self.config.min_fov_degrees, self.config.max_fov_degrees);
            self.zoom_delta = 0.0;
        }

        camera.position = camera.interest + self.offset();
    }
}
