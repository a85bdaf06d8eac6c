use glam::Vec3;

use crate::camera::{Camera, CameraProjector};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            0.0
        }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        (0.0..=self.width).contains(&x) && (0.0..=self.height).contains(&y)
    }
}

/// Pixel-space position of a 3D point. `depth` is the NDC depth in `[0, 1]`
/// for points between the clip planes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    pub depth: f32,
    pub visible: bool,
}

impl ScreenPoint {
    const HIDDEN: ScreenPoint = ScreenPoint {
        x: 0.0,
        y: 0.0,
        depth: f32::INFINITY,
        visible: false,
    };

    pub fn distance_squared_to(&self, x: f32, y: f32) -> f32 {
        let dx = self.x - x;
        let dy = self.y - y;
        dx * dx + dy * dy
    }
}

/// Project a world point to pixel coordinates for the given camera and viewport.
pub fn project_to_screen(point: Vec3, camera: &Camera, width: f32, height: f32) -> ScreenPoint {
    let viewport = Viewport::new(width, height);
    match camera.projector(viewport.aspect_ratio()) {
        Some(projector) => project_with(&projector, point, viewport),
        None => ScreenPoint::HIDDEN,
    }
}

/// Same as `project_to_screen` with a projector computed once per frame.
pub fn project_with(projector: &CameraProjector, point: Vec3, viewport: Viewport) -> ScreenPoint {
    let clip = projector.clip(point);
    if !clip.is_finite() || clip.w.abs() <= f32::EPSILON {
        return ScreenPoint::HIDDEN;
    }
    let ndc = clip.truncate() / clip.w;
    let x = (ndc.x * 0.5 + 0.5) * viewport.width;
    let y = (-ndc.y * 0.5 + 0.5) * viewport.height;
    let in_front = clip.w > 0.0;
    let within_depth = (0.0..=1.0).contains(&ndc.z);
    ScreenPoint {
        x,
        y,
        depth: ndc.z,
        visible: in_front && within_depth && viewport.contains(x, y),
    }
}

#[cfg(test)]
mod projection_tests {
    use super::*;
    const EPSILON: f32 = 1e-3;

    #[test]
    fn point_straight_ahead_lands_mid_screen() {
        let camera = Camera::default();
        let screen = project_to_screen(Vec3::new(0.0, 0.0, -20.0), &camera, 800.0, 600.0);
        assert!(screen.visible);
        assert!((screen.x - 400.0).abs() <= EPSILON);
        assert!((screen.y - 300.0).abs() <= EPSILON);
        assert!((0.0..=1.0).contains(&screen.depth));
    }

    #[test]
    fn screen_y_grows_downward() {
        let camera = Camera::default();
        let above = project_to_screen(Vec3::new(0.0, 3.0, -20.0), &camera, 800.0, 600.0);
        let below = project_to_screen(Vec3::new(0.0, -3.0, -20.0), &camera, 800.0, 600.0);
        assert!(above.visible && below.visible);
        assert!(above.y < 300.0 && below.y > 300.0);
    }

    #[test]
    fn repeated_projection_is_identical() {
        let camera = Camera::default();
        let point = Vec3::new(3.5, -1.25, -12.0);
        let first = project_to_screen(point, &camera, 1280.0, 720.0);
        for _ in 0..16 {
            assert_eq!(project_to_screen(point, &camera, 1280.0, 720.0), first);
        }
    }

    #[test]
    fn points_behind_the_camera_are_hidden() {
        let camera = Camera::default();
        let behind = Vec3::new(0.0, 0.0, 20.0);
        let view_direction = behind - camera.position;
        assert!(view_direction.dot(camera.forward()) <= 0.0);
        let screen = project_to_screen(behind, &camera, 800.0, 600.0);
        assert!(!screen.visible);
    }

    #[test]
    fn points_past_the_far_plane_are_hidden() {
        let camera = Camera::default();
        let screen = project_to_screen(Vec3::new(0.0, 0.0, -5000.0), &camera, 800.0, 600.0);
        assert!(screen.depth > 1.0);
        assert!(!screen.visible);
    }

    #[test]
    fn points_outside_the_frustum_sides_are_hidden() {
        let camera = Camera::default();
        let screen = project_to_screen(Vec3::new(100.0, 0.0, -1.0), &camera, 800.0, 600.0);
        assert!(screen.x > 800.0);
        assert!(!screen.visible);
    }

    #[test]
    fn empty_viewport_hides_everything() {
        let camera = Camera::default();
        let screen = project_to_screen(Vec3::new(0.0, 0.0, -20.0), &camera, 0.0, 0.0);
        assert!(!screen.visible);
    }
}
