//! Validated tour data. `manifest` turns the raw JSON into these types once at
//! startup; everything downstream (scene manager, renderer) works against the
//! resolved paths, normalized colors, and finite coordinates stored here.

use std::path::{Path, PathBuf};

use glam::Vec3;

use crate::error::SceneNotFoundError;

/// Packed `0xRRGGBB` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Color = Color(0xff_ff_ff);

    /// Accepts `#rrggbb`, `0xrrggbb`, `rrggbb` and the `#rgb` shorthand.
    pub fn parse_hex(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let digits = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match digits.len() {
            6 => u32::from_str_radix(digits, 16).ok().map(Color),
            3 => {
                let expanded: String = digits.chars().flat_map(|c| [c, c]).collect();
                u32::from_str_radix(&expanded, 16).ok().map(Color)
            }
            _ => None,
        }
    }

    pub fn from_number(value: u64) -> Option<Self> {
        if value <= 0xff_ff_ff {
            Some(Color(value as u32))
        } else {
            None
        }
    }

    pub fn rgb(self) -> [f32; 3] {
        let r = ((self.0 >> 16) & 0xff) as f32 / 255.0;
        let g = ((self.0 >> 8) & 0xff) as f32 / 255.0;
        let b = (self.0 & 0xff) as f32 / 255.0;
        [r, g, b]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathOverlay {
    pub color: Color,
    pub layer: Option<String>,
    pub points: Vec<Vec3>,
}

impl PathOverlay {
    /// Consecutive point pairs in manifest order.
    pub fn segments(&self) -> impl Iterator<Item = (Vec3, Vec3)> + '_ {
        self.points.windows(2).map(|pair| (pair[0], pair[1]))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    pub position: Vec3,
    pub target_id: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub id: String,
    pub name: String,
    /// Image reference as written in the manifest.
    pub image: String,
    /// `image` after alias lookup and base-directory resolution.
    pub image_path: PathBuf,
    pub paths: Vec<PathOverlay>,
    pub hotspots: Vec<Hotspot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tour {
    scenes: Vec<Scene>,
    base_dir: PathBuf,
}

impl Tour {
    /// Callers are expected to have validated the scenes (see `manifest`).
    pub(crate) fn new(scenes: Vec<Scene>, base_dir: PathBuf) -> Self {
        Self { scenes, base_dir }
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn scene(&self, index: usize) -> Result<&Scene, SceneNotFoundError> {
        self.scenes.get(index).ok_or(SceneNotFoundError::Index {
            index,
            count: self.scenes.len(),
        })
    }

    pub fn scene_index(&self, id: &str) -> Result<usize, SceneNotFoundError> {
        self.scenes
            .iter()
            .position(|scene| scene.id == id)
            .ok_or_else(|| SceneNotFoundError::Id(id.to_string()))
    }

    /// Distinct path layer names across all scenes, sorted.
    pub fn layers(&self) -> Vec<String> {
        let mut layers: Vec<String> = self
            .scenes
            .iter()
            .flat_map(|scene| scene.paths.iter())
            .filter_map(|path| path.layer.clone())
            .collect();
        layers.sort();
        layers.dedup();
        layers
    }

    /// Hotspots whose target id does not name a scene, as `(scene id, target id)`.
    pub fn unresolved_hotspots(&self) -> Vec<(&str, &str)> {
        self.scenes
            .iter()
            .flat_map(|scene| {
                scene
                    .hotspots
                    .iter()
                    .map(move |hotspot| (scene.id.as_str(), hotspot.target_id.as_str()))
            })
            .filter(|(_, target)| self.scene_index(target).is_err())
            .collect()
    }
}


#[cfg(test)]
mod tour_lookup_tests {
    use super::*;

    fn scene(id: &str, targets: &[&str]) -> Scene {
        Scene {
            id: id.to_string(),
            name: id.to_uppercase(),
            image: format!("{id}.jpg"),
            image_path: PathBuf::from(format!("{id}.jpg")),
            paths: vec![PathOverlay {
                color: Color::WHITE,
                layer: Some("WP".into()),
                points: vec![Vec3::ZERO, Vec3::X],
            }],
            hotspots: targets
                .iter()
                .map(|target| Hotspot {
                    position: Vec3::Z,
                    target_id: target.to_string(),
                    label: None,
                })
                .collect(),
        }
    }

    #[test]
    fn lookups_report_missing_scenes() {
        let tour = Tour::new(vec![scene("a", &["b"]), scene("b", &["a"])], PathBuf::new());
        assert_eq!(tour.scene_index("b"), Ok(1));
        assert_eq!(
            tour.scene_index("c"),
            Err(SceneNotFoundError::Id("c".into()))
        );
        assert_eq!(
            tour.scene(5).map(|scene| scene.id.clone()),
            Err(SceneNotFoundError::Index { index: 5, count: 2 })
        );
    }

    #[test]
    fn unresolved_hotspots_are_listed() {
        let tour = Tour::new(vec![scene("a", &["b", "ghost"]), scene("b", &[])], PathBuf::new());
        assert_eq!(tour.unresolved_hotspots(), vec![("a", "ghost")]);
        assert_eq!(tour.layers(), vec!["WP".to_string()]);
    }
}
