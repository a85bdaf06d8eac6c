use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::tour::Color;

pub const DEFAULT_SPHERE_RADIUS: f32 = 50.0;
pub const DEFAULT_SPHERE_SEGMENTS: u32 = 64;
pub const DEFAULT_PATH_RADIUS: f32 = 0.05;
pub const DEFAULT_PATH_RADIAL_SEGMENTS: u32 = 8;
pub const DEFAULT_MARKER_RADIUS_PX: f32 = 14.0;
pub const DEFAULT_MAX_TEXTURE_SIDE: u32 = 8192;

#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near_clip: f32,
    pub far_clip: f32,
    /// Distance between the eye and the orbit centre.
    pub distance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near_clip: 0.1,
            far_clip: 1000.0,
            distance: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControlsConfig {
    pub rotate_speed: f32,
    pub damping: f32,
    pub auto_rotate: bool,
    /// Matches OrbitControls: 2.0 is one revolution every 30 seconds.
    pub auto_rotate_speed: f32,
    pub min_fov_degrees: f32,
    pub max_fov_degrees: f32,
    pub zoom_step_degrees: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            rotate_speed: 1.0,
            damping: 0.05,
            auto_rotate: true,
            auto_rotate_speed: 0.5,
            min_fov_degrees: 30.0,
            max_fov_degrees: 90.0,
            zoom_step_degrees: 2.5,
        }
    }
}

/// Everything the scene manager and renderer need to size and place objects.
///
/// Manifest coordinates are world units; `world_scale` is the single uniform
/// factor applied to path points and hotspot positions.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub sphere_radius: f32,
    pub sphere_width_segments: u32,
    pub sphere_height_segments: u32,
    pub world_scale: f32,
    pub path_radius: f32,
    pub path_radial_segments: u32,
    pub marker_radius_px: f32,
    pub max_texture_side: u32,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub layer_colors: BTreeMap<String, Color>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        let layer_colors = BTreeMap::from([
            ("EL".to_string(), Color(0xff0000)),
            ("WP".to_string(), Color(0x0000ff)),
            ("AC".to_string(), Color(0x00ff00)),
        ]);
        Self {
            sphere_radius: DEFAULT_SPHERE_RADIUS,
            sphere_width_segments: DEFAULT_SPHERE_SEGMENTS,
            sphere_height_segments: DEFAULT_SPHERE_SEGMENTS,
            world_scale: 1.0,
            path_radius: DEFAULT_PATH_RADIUS,
            path_radial_segments: DEFAULT_PATH_RADIAL_SEGMENTS,
            marker_radius_px: DEFAULT_MARKER_RADIUS_PX,
            max_texture_side: DEFAULT_MAX_TEXTURE_SIDE,
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            layer_colors,
        }
    }
}

impl ViewerConfig {
    pub fn from_preset(preset: &ViewerPreset) -> Result<Self> {
        let mut config = Self::default();
        config.apply_preset(preset)?;
        Ok(config)
    }

    pub fn apply_preset(&mut self, preset: &ViewerPreset) -> Result<()> {
        if let Some(radius) = preset.sphere_radius {
            self.sphere_radius = radius;
        }
        if let Some(segments) = preset.sphere_segments {
            self.sphere_width_segments = segments;
            self.sphere_height_segments = segments;
        }
        if let Some(scale) = preset.world_scale {
            self.world_scale = scale;
        }
        if let Some(radius) = preset.path_radius {
            self.path_radius = radius;
        }
        if let Some(segments) = preset.path_radial_segments {
            self.path_radial_segments = segments;
        }
        if let Some(radius) = preset.marker_radius_px {
            self.marker_radius_px = radius;
        }
        if let Some(side) = preset.max_texture_side {
            self.max_texture_side = side;
        }
        if let Some(camera) = preset.camera.as_ref() {
            if let Some(fov) = camera.fov_degrees {
                self.camera.fov_degrees = fov;
            }
            if let Some(near) = camera.near_clip {
                self.camera.near_clip = near;
            }
            if let Some(far) = camera.far_clip {
                self.camera.far_clip = far;
            }
            if let Some(distance) = camera.distance {
                self.camera.distance = distance;
            }
        }
        if let Some(controls) = preset.controls.as_ref() {
            if let Some(speed) = controls.rotate_speed {
                self.controls.rotate_speed = speed;
            }
            if let Some(damping) = controls.damping {
                self.controls.damping = damping;
            }
            if let Some(auto_rotate) = controls.auto_rotate {
                self.controls.auto_rotate = auto_rotate;
            }
            if let Some(speed) = controls.auto_rotate_speed {
                self.controls.auto_rotate_speed = speed;
            }
            if let Some(min) = controls.min_fov_degrees {
                self.controls.min_fov_degrees = min;
            }
            if let Some(max) = controls.max_fov_degrees {
                self.controls.max_fov_degrees = max;
            }
        }
        for (layer, value) in &preset.layer_colors {
            let color = Color::parse_hex(value)
                .with_context(|| format!("layer '{layer}' color '{value}' is not a hex color"))?;
            self.layer_colors.insert(layer.clone(), color);
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.sphere_radius.is_finite() && self.sphere_radius > 0.0,
            "sphere_radius must be positive (got {})",
            self.sphere_radius
        );
        ensure!(
            self.sphere_width_segments >= 3 && self.sphere_height_segments >= 2,
            "sphere needs at least 3x2 segments"
        );
        ensure!(
            self.world_scale.is_finite() && self.world_scale > 0.0,
            "world_scale must be positive (got {})",
            self.world_scale
        );
        ensure!(
            self.path_radial_segments >= 3,
            "path_radial_segments must be at least 3"
        );
        ensure!(
            self.camera.near_clip > 0.0 && self.camera.far_clip > self.camera.near_clip,
            "camera clip planes must satisfy 0 < near < far"
        );
        ensure!(
            self.camera.far_clip > self.sphere_radius + self.camera.distance,
            "far clip {} would cut the panorama sphere (radius {})",
            self.camera.far_clip,
            self.sphere_radius
        );
        ensure!(
            self.controls.min_fov_degrees > 0.0
                && self.controls.min_fov_degrees <= self.controls.max_fov_degrees
                && self.controls.max_fov_degrees < 180.0,
            "fov limits must satisfy 0 < min <= max < 180"
        );
        ensure!(
            (0.0..1.0).contains(&self.controls.damping),
            "damping must be in [0, 1)"
        );
        ensure!(self.max_texture_side > 0, "max_texture_side must be positive");
        Ok(())
    }

    /// Layer default color, falling back to white.
    pub fn layer_color(&self, layer: Option<&str>) -> Color {
        layer
            .and_then(|name| self.layer_colors.get(name))
            .copied()
            .unwrap_or(Color::WHITE)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ViewerPreset {
    #[serde(default)]
    pub sphere_radius: Option<f32>,
    #[serde(default)]
    pub sphere_segments: Option<u32>,
    #[serde(default)]
    pub world_scale: Option<f32>,
    #[serde(default)]
    pub path_radius: Option<f32>,
    #[serde(default)]
    pub path_radial_segments: Option<u32>,
    #[serde(default)]
    pub marker_radius_px: Option<f32>,
    #[serde(default)]
    pub max_texture_side: Option<u32>,
    #[serde(default)]
    pub camera: Option<CameraPreset>,
    #[serde(default)]
    pub controls: Option<ControlsPreset>,
    #[serde(default)]
    pub layer_colors: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CameraPreset {
    #[serde(default)]
    pub fov_degrees: Option<f32>,
    #[serde(default)]
    pub near_clip: Option<f32>,
    #[serde(default)]
    pub far_clip: Option<f32>,
    #[serde(default)]
    pub distance: Option<f32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ControlsPreset {
    #[serde(default)]
    pub rotate_speed: Option<f32>,
    #[serde(default)]
    pub damping: Option<f32>,
    #[serde(default)]
    pub auto_rotate: Option<bool>,
    #[serde(default)]
    pub auto_rotate_speed: Option<f32>,
    #[serde(default)]
    pub min_fov_degrees: Option<f32>,
    #[serde(default)]
    pub max_fov_degrees: Option<f32>,
}

pub fn load_viewer_preset(path: &Path) -> Result<ViewerPreset> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading viewer preset {}", path.display()))?;
    let preset: ViewerPreset = serde_json::from_str(&data)
        .with_context(|| format!("parsing viewer preset {}", path.display()))?;
    Ok(preset)
}
