//! JSON tour manifest parsing. The manifest is read once at startup; the raw
//! serde shapes stay private and are validated into `tour::Tour` so the scene
//! manager never sees malformed colors, short paths, or duplicate ids.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
};

use glam::Vec3;
use serde::Deserialize;

use crate::config::ViewerConfig;
use crate::error::ManifestError;
use crate::tour::{Color, Hotspot, PathOverlay, Scene, Tour};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    scenes: Vec<RawScene>,
    /// Declarative image aliases: scene `image` values are looked up here first.
    #[serde(default)]
    images: BTreeMap<String, String>,
    #[serde(default)]
    image_root: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawScene {
    id: String,
    #[serde(default)]
    name: Option<String>,
    image: String,
    #[serde(default)]
    paths: Vec<RawPath>,
    #[serde(default)]
    hotspots: Vec<RawHotspot>,
}

#[derive(Debug, Deserialize)]
struct RawPath {
    #[serde(default)]
    color: Option<RawColor>,
    #[serde(default, alias = "type")]
    layer: Option<String>,
    points: Vec<[f32; 3]>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawColor {
    Integer(u64),
    Float(f64),
    Text(String),
}

impl RawColor {
    fn normalize(&self) -> Option<Color> {
        match self {
            RawColor::Integer(value) => Color::from_number(*value),
            RawColor::Float(value) => {
                if value.fract() == 0.0 && *value >= 0.0 {
                    Color::from_number(*value as u64)
                } else {
                    None
                }
            }
            RawColor::Text(text) => Color::parse_hex(text),
        }
    }

    fn describe(&self) -> String {
        match self {
            RawColor::Integer(value) => value.to_string(),
            RawColor::Float(value) => value.to_string(),
            RawColor::Text(text) => format!("'{text}'"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHotspot {
    position: [f32; 3],
    #[serde(alias = "target_id")]
    target_id: String,
    #[serde(default)]
    label: Option<String>,
}

/// Read and validate a manifest file. Relative image paths resolve against the
/// manifest's directory.
pub fn load_manifest(path: &Path, config: &ViewerConfig) -> Result<Tour, ManifestError> {
    let data = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    parse_manifest(&data, &base_dir, config)
}

pub fn parse_manifest(
    json: &str,
    base_dir: &Path,
    config: &ViewerConfig,
) -> Result<Tour, ManifestError> {
    let raw: RawManifest = serde_json::from_str(json)?;
    if raw.scenes.is_empty() {
        return Err(ManifestError::Empty);
    }

    let image_root = match raw.image_root.as_ref() {
        Some(root) => base_dir.join(root),
        None => base_dir.to_path_buf(),
    };

    let mut seen = BTreeSet::new();
    let mut scenes = Vec::with_capacity(raw.scenes.len());
    for raw_scene in raw.scenes {
        if raw_scene.id.trim().is_empty() {
            return Err(ManifestError::EmptySceneId {
                scene: raw_scene.name.unwrap_or_default(),
            });
        }
        if !seen.insert(raw_scene.id.clone()) {
            return Err(ManifestError::DuplicateSceneId(raw_scene.id));
        }
        scenes.push(build_scene(raw_scene, &raw.images, &image_root, config)?);
    }

    let tour = Tour::new(scenes, base_dir.to_path_buf());
    for (scene_id, target_id) in tour.unresolved_hotspots() {
        log::warn!("scene '{scene_id}' has a hotspot targeting unknown scene '{target_id}'");
    }
    Ok(tour)
}

fn build_scene(
    raw: RawScene,
    aliases: &BTreeMap<String, String>,
    image_root: &Path,
    config: &ViewerConfig,
) -> Result<Scene, ManifestError> {
    let RawScene {
        id,
        name,
        image,
        paths,
        hotspots,
    } = raw;

    let mut overlays = Vec::with_capacity(paths.len());
    for (path_index, path) in paths.into_iter().enumerate() {
        if path.points.len() < 2 {
            return Err(ManifestError::TooFewPoints {
                scene: id,
                path_index,
                count: path.points.len(),
            });
        }
        let color = match path.color.as_ref() {
            Some(raw_color) => {
                raw_color
                    .normalize()
                    .ok_or_else(|| ManifestError::InvalidColor {
                        scene: id.clone(),
                        path_index,
                        value: raw_color.describe(),
                    })?
            }
            None => config.layer_color(path.layer.as_deref()),
        };
        let mut points = Vec::with_capacity(path.points.len());
        for point in &path.points {
            points.push(finite_point(point, &id, || format!("path {path_index}"))?);
        }
        overlays.push(PathOverlay {
            color,
            layer: path.layer,
            points,
        });
    }

    let mut markers = Vec::with_capacity(hotspots.len());
    for (hotspot_index, hotspot) in hotspots.into_iter().enumerate() {
        let position = finite_point(&hotspot.position, &id, || {
            format!("hotspot {hotspot_index}")
        })?;
        markers.push(Hotspot {
            position,
            target_id: hotspot.target_id,
            label: hotspot.label,
        });
    }

    let image_path = resolve_image(&image, aliases, image_root);
    Ok(Scene {
        name: name.unwrap_or_else(|| id.clone()),
        id,
        image,
        image_path,
        paths: overlays,
        hotspots: markers,
    })
}

fn finite_point(
    point: &[f32; 3],
    scene: &str,
    context: impl FnOnce() -> String,
) -> Result<Vec3, ManifestError> {
    let vec = Vec3::from_array(*point);
    if vec.is_finite() {
        Ok(vec)
    } else {
        Err(ManifestError::InvalidCoordinate {
            scene: scene.to_string(),
            context: context(),
        })
    }
}

fn resolve_image(reference: &str, aliases: &BTreeMap<String, String>, root: &Path) -> PathBuf {
    let target = aliases
        .get(reference)
        .map(String::as_str)
        .unwrap_or(reference);
    let path = Path::new(target);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
