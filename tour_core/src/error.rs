use std::path::PathBuf;

use thiserror::Error;

/// Tour data could not be read or did not describe a usable tour.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("reading tour manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing tour manifest: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("tour manifest lists no scenes")]
    Empty,
    #[error("scene id '{0}' appears more than once")]
    DuplicateSceneId(String),
    #[error("scene '{scene}' has an empty id")]
    EmptySceneId { scene: String },
    #[error("scene '{scene}' path {path_index} has {count} point(s); at least 2 are required")]
    TooFewPoints {
        scene: String,
        path_index: usize,
        count: usize,
    },
    #[error("scene '{scene}' path {path_index} has unrecognised color {value}")]
    InvalidColor {
        scene: String,
        path_index: usize,
        value: String,
    },
    #[error("scene '{scene}' contains a non-finite coordinate in {context}")]
    InvalidCoordinate { scene: String, context: String },
}

/// A scene reference (index or id) that does not resolve against the tour.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneNotFoundError {
    #[error("scene index {index} is out of range for a tour of {count} scene(s)")]
    Index { index: usize, count: usize },
    #[error("no scene with id '{0}'")]
    Id(String),
}

/// The panorama image for a scene could not be fetched or decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("loading panorama for scene '{scene_id}' from {}: {reason}", path.display())]
pub struct ImageLoadError {
    pub scene_id: String,
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum TourError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    SceneNotFound(#[from] SceneNotFoundError),
    #[error(transparent)]
    ImageLoad(#[from] ImageLoadError),
}
