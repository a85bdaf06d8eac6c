//! Core of the panorama tour viewer.
//!
//! A tour is a list of scenes, each an equirectangular panorama with optional
//! 3D path overlays and hotspots that link to other scenes. `ViewerState`
//! drives scene transitions against an asynchronous `ImageLoader`, keeps the
//! render graph for the displayed scene, and projects hotspots to screen space
//! every frame. Nothing here talks to a GPU or a window.

pub mod camera;
pub mod config;
pub mod controls;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod loader;
pub mod manager;
pub mod manifest;
pub mod projection;
pub mod tour;

pub use camera::{Camera, CameraProjector};
pub use config::{ViewerConfig, ViewerPreset, load_viewer_preset};
pub use controls::{CameraControl, OrbitControls};
pub use error::{ImageLoadError, ManifestError, SceneNotFoundError, TourError};
pub use geometry::{
    MeshData, SegmentPrimitive, build_panorama_sphere, build_unit_cylinder, segment_between,
};
pub use graph::{MarkerNode, NodeId, NodeKind, PanoramaNode, SceneGraph, SegmentNode};
pub use loader::{
    ImageLoadResult, ImageLoader, ImageRequest, LoadToken, PanoramaImage, ThreadedImageLoader,
};
pub use manager::{FrameStats, LoadOutcome, ViewerState};
pub use manifest::{load_manifest, parse_manifest};
pub use projection::{ScreenPoint, Viewport, project_to_screen};
pub use tour::{Color, Hotspot, PathOverlay, Scene, Tour};
