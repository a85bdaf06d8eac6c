//! Tour scene manager. `ViewerState` owns the tour, the camera and the render
//! graph, and is the only thing that mutates them. Transitions detach the old
//! scene synchronously, issue an image request tagged with a fresh
//! `LoadToken`, and attach the new scene when the matching completion is
//! applied during `tick`. Completions carrying any other token are dropped, so
//! overlapping transitions cannot interleave their objects.

use std::path::Path;

use crate::camera::Camera;
use crate::config::ViewerConfig;
use crate::controls::CameraControl;
use crate::error::{ImageLoadError, SceneNotFoundError, TourError};
use crate::geometry::segment_between;
use crate::graph::{MarkerNode, NodeId, NodeKind, PanoramaNode, SceneGraph, SegmentNode};
use crate::loader::{ImageLoadResult, ImageLoader, ImageRequest, LoadToken};
use crate::manifest::load_manifest;
use crate::projection::{Viewport, project_with};
use crate::tour::{Scene, Tour};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingLoad {
    token: LoadToken,
    scene_index: usize,
}

/// What applying one image completion did to the graph.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Attached {
        scene_index: usize,
        token: LoadToken,
    },
    /// The scene's overlays were attached without a panorama.
    Failed(ImageLoadError),
    /// A newer transition superseded this request.
    Stale { token: LoadToken },
}

/// Per-frame summary returned by `ViewerState::tick`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameStats {
    pub frame: u64,
    pub scene_index: usize,
    pub loading: bool,
    pub panorama_attached: bool,
    pub segment_count: usize,
    pub marker_count: usize,
    pub visible_markers: usize,
    pub outcomes: Vec<LoadOutcome>,
}

pub struct ViewerState {
    config: ViewerConfig,
    tour: Tour,
    graph: SceneGraph,
    camera: Camera,
    viewport: Viewport,
    current_scene: usize,
    displayed_scene: Option<usize>,
    pending: Option<PendingLoad>,
    last_token: LoadToken,
    last_error: Option<ImageLoadError>,
    cursor: Option<(f32, f32)>,
    frame: u64,
}

impl ViewerState {
    /// Parse the manifest at `manifest_path` and start loading its first scene.
    pub fn load_tour(
        manifest_path: &Path,
        config: ViewerConfig,
        loader: &mut dyn ImageLoader,
    ) -> Result<Self, TourError> {
        let tour = load_manifest(manifest_path, &config)?;
        log::info!(
            "loaded tour manifest {} ({} scene(s))",
            manifest_path.display(),
            tour.len()
        );
        Self::with_tour(tour, config, loader)
    }

    pub fn with_tour(
        tour: Tour,
        config: ViewerConfig,
        loader: &mut dyn ImageLoader,
    ) -> Result<Self, TourError> {
        let camera = Camera::from_config(&config.camera);
        let mut state = Self {
            config,
            tour,
            graph: SceneGraph::new(),
            camera,
            viewport: Viewport::new(0.0, 0.0),
            current_scene: 0,
            displayed_scene: None,
            pending: None,
            last_token: LoadToken::default(),
            last_error: None,
            cursor: None,
            frame: 0,
        };
        state.transition_to(0, loader)?;
        Ok(state)
    }

    /// Switch to the scene at `index`. On error nothing changes.
    pub fn transition_to(
        &mut self,
        index: usize,
        loader: &mut dyn ImageLoader,
    ) -> Result<LoadToken, SceneNotFoundError> {
        let scene = self.tour.scene(index)?;
        let scene_id = scene.id.clone();
        let path = scene.image_path.clone();

        let removed = self.graph.clear();
        self.displayed_scene = None;
        self.last_token = self.last_token.next();
        let token = self.last_token;
        if let Some(previous) = self.pending.replace(PendingLoad {
            token,
            scene_index: index,
        }) {
            log::debug!(
                "superseding in-flight load {} for scene {}",
                previous.token.raw(),
                previous.scene_index
            );
        }
        self.current_scene = index;
        self.last_error = None;

        log::info!(
            "transition to scene {index} '{scene_id}' (detached {removed} node(s), load token {})",
            token.raw()
        );
        loader.request(ImageRequest {
            token,
            scene_index: index,
            scene_id,
            path,
        });
        Ok(token)
    }

    pub fn transition_to_id(
        &mut self,
        id: &str,
        loader: &mut dyn ImageLoader,
    ) -> Result<LoadToken, SceneNotFoundError> {
        let index = self.tour.scene_index(id)?;
        self.transition_to(index, loader)
    }

    pub fn next_scene(
        &mut self,
        loader: &mut dyn ImageLoader,
    ) -> Result<LoadToken, SceneNotFoundError> {
        let count = self.tour.len().max(1);
        self.transition_to((self.current_scene + 1) % count, loader)
    }

    pub fn previous_scene(
        &mut self,
        loader: &mut dyn ImageLoader,
    ) -> Result<LoadToken, SceneNotFoundError> {
        let count = self.tour.len().max(1);
        self.transition_to((self.current_scene + count - 1) % count, loader)
    }

    /// Apply one loader completion. Only the completion for the most recent
    /// transition attaches anything.
    pub fn apply_load_result(&mut self, result: ImageLoadResult) -> LoadOutcome {
        let pending = match self.pending {
            Some(pending) if pending.token == result.token => pending,
            _ => {
                log::debug!(
                    "discarding stale image result for scene {} (token {})",
                    result.scene_index,
                    result.token.raw()
                );
                return LoadOutcome::Stale {
                    token: result.token,
                };
            }
        };
        self.pending = None;
        let scene_index = pending.scene_index;

        match result.outcome {
            Ok(image) => {
                log::info!(
                    "panorama {}x{} ready for scene {scene_index}",
                    image.width,
                    image.height
                );
                self.graph.attach_panorama(
                    scene_index,
                    PanoramaNode {
                        image,
                        radius: self.config.sphere_radius,
                    },
                );
                self.attach_overlays(scene_index);
                LoadOutcome::Attached {
                    scene_index,
                    token: pending.token,
                }
            }
            Err(err) => {
                log::warn!("{err}; showing scene {scene_index} without a panorama");
                self.attach_overlays(scene_index);
                self.last_error = Some(err.clone());
                LoadOutcome::Failed(err)
            }
        }
    }

    fn attach_overlays(&mut self, scene_index: usize) {
        let Some(scene) = self.tour.scenes().get(scene_index) else {
            return;
        };
        let scale = self.config.world_scale;

        for (path_index, path) in scene.paths.iter().enumerate() {
            for (start, end) in path.segments() {
                match segment_between(start * scale, end * scale) {
                    Some(primitive) => {
                        self.graph.attach(
                            scene_index,
                            NodeKind::PathSegment(SegmentNode {
                                primitive,
                                color: path.color,
                                layer: path.layer.clone(),
                                path_index,
                            }),
                        );
                    }
                    None => log::warn!(
                        "scene '{}' path {path_index}: skipping zero-length segment at {start}",
                        scene.id
                    ),
                }
            }
        }

        for (hotspot_index, hotspot) in scene.hotspots.iter().enumerate() {
            let target_index = self.tour.scene_index(&hotspot.target_id).ok();
            self.graph.attach(
                scene_index,
                NodeKind::HotspotMarker(MarkerNode {
                    hotspot_index,
                    position: hotspot.position * scale,
                    target_id: hotspot.target_id.clone(),
                    target_index,
                    label: hotspot.label.clone(),
                    screen: None,
                    hovered: false,
                }),
            );
        }

        self.displayed_scene = Some(scene_index);
    }

    /// One frame: apply finished loads, advance the camera, and re-project
    /// every marker. Never fails; load errors are kept in `last_error`.
    pub fn tick(
        &mut self,
        loader: &mut dyn ImageLoader,
        controls: &mut dyn CameraControl,
        dt: f32,
        viewport: Viewport,
    ) -> FrameStats {
        self.frame += 1;
        self.viewport = viewport;

        let outcomes: Vec<LoadOutcome> = loader
            .drain()
            .into_iter()
            .map(|result| self.apply_load_result(result))
            .collect();

        controls.update(&mut self.camera, dt);
        let visible_markers = self.refresh_marker_screens();
        log::trace!("frame {}: {visible_markers} marker(s) on screen", self.frame);

        FrameStats {
            frame: self.frame,
            scene_index: self.current_scene,
            loading: self.pending.is_some(),
            panorama_attached: self.graph.panorama().is_some(),
            segment_count: self.graph.segment_count(),
            marker_count: self.graph.marker_count(),
            visible_markers,
            outcomes,
        }
    }

    fn refresh_marker_screens(&mut self) -> usize {
        let viewport = self.viewport;
        let projector = self.camera.projector(viewport.aspect_ratio());
        let mut visible = 0;
        for (_, marker) in self.graph.markers_mut() {
            marker.screen = projector
                .as_ref()
                .map(|projector| project_with(projector, marker.position, viewport));
            if marker.visible_screen().is_some() {
                visible += 1;
            }
        }
        self.refresh_hover();
        visible
    }

    fn refresh_hover(&mut self) -> Option<NodeId> {
        let hit = self.cursor.and_then(|(x, y)| self.marker_at(x, y));
        for (id, marker) in self.graph.markers_mut() {
            marker.hovered = Some(id) == hit;
        }
        hit
    }

    /// Nearest on-screen marker within the configured radius of `(x, y)`.
    pub fn marker_at(&self, x: f32, y: f32) -> Option<NodeId> {
        let radius_sq = self.config.marker_radius_px * self.config.marker_radius_px;
        self.graph
            .markers()
            .filter_map(|(id, marker)| {
                let screen = marker.visible_screen()?;
                let distance = screen.distance_squared_to(x, y);
                (distance <= radius_sq).then_some((id, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Highlight the marker under the cursor, if any. The cursor is
    /// remembered so the highlight follows the markers as the camera moves.
    pub fn hover(&mut self, x: f32, y: f32) -> Option<NodeId> {
        self.cursor = Some((x, y));
        self.refresh_hover()
    }

    /// The cursor left the view; nothing is hovered until it returns.
    pub fn clear_hover(&mut self) {
        self.cursor = None;
        self.refresh_hover();
    }

    /// Activate whatever marker sits under `(x, y)`. A miss is `Ok(None)`.
    pub fn click(
        &mut self,
        x: f32,
        y: f32,
        loader: &mut dyn ImageLoader,
    ) -> Result<Option<LoadToken>, SceneNotFoundError> {
        match self.marker_at(x, y) {
            Some(id) => self.activate_marker(id, loader),
            None => Ok(None),
        }
    }

    /// Transition to the scene a marker points at. `Ok(None)` if `id` is not
    /// an attached marker.
    pub fn activate_marker(
        &mut self,
        id: NodeId,
        loader: &mut dyn ImageLoader,
    ) -> Result<Option<LoadToken>, SceneNotFoundError> {
        let Some(marker) = self.graph.marker(id) else {
            return Ok(None);
        };
        let target_id = marker.target_id.clone();
        match self.tour.scene_index(&target_id) {
            Ok(index) => self.transition_to(index, loader).map(Some),
            Err(err) => {
                log::warn!(
                    "hotspot {} in scene '{}': {err}",
                    marker.hotspot_index,
                    self.current_scene().id
                );
                Err(err)
            }
        }
    }

    pub fn set_layer_visible(&mut self, layer: &str, visible: bool) {
        log::info!(
            "path layer '{layer}' {}",
            if visible { "shown" } else { "hidden" }
        );
        self.graph.set_layer_visible(layer, visible);
    }

    /// Flip a layer's visibility, returning the new state.
    pub fn toggle_layer(&mut self, layer: &str) -> bool {
        let visible = !self.graph.is_layer_visible(layer);
        self.set_layer_visible(layer, visible);
        visible
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn tour(&self) -> &Tour {
        &self.tour
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn current_scene_index(&self) -> usize {
        self.current_scene
    }

    pub fn current_scene(&self) -> &Scene {
        &self.tour.scenes()[self.current_scene]
    }

    /// Scene whose overlays are attached; `None` while a load is pending.
    pub fn displayed_scene(&self) -> Option<usize> {
        self.displayed_scene
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_token(&self) -> Option<LoadToken> {
        self.pending.map(|pending| pending.token)
    }

    pub fn last_error(&self) -> Option<&ImageLoadError> {
        self.last_error.as_ref()
    }
}

#[cfg(test)]
mod transition_tests {
    use super::*;
    use crate::controls::OrbitControls;
    use crate::loader::PanoramaImage;
    use crate::manifest::parse_manifest;
    use glam::Vec3;
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    /// Loader that records requests and completes them only when told to.
    #[derive(Default)]
    struct ManualLoader {
        requests: Vec<ImageRequest>,
        completed: Vec<ImageLoadResult>,
    }

    impl ManualLoader {
        fn request_for(&self, token: LoadToken) -> &ImageRequest {
            self.requests
                .iter()
                .find(|request| request.token == token)
                .expect("request issued for token")
        }

        fn succeed(&mut self, token: LoadToken) {
            let request = self.request_for(token).clone();
            let image = PanoramaImage {
                width: 4,
                height: 2,
                rgba: vec![255; 32],
                source: request.path.clone(),
            };
            self.completed.push(request.succeed(image));
        }

        fn fail(&mut self, token: LoadToken) {
            let request = self.request_for(token).clone();
            self.completed.push(request.fail("404 not found"));
        }

        fn last_token(&self) -> LoadToken {
            self.requests.last().expect("a request").token
        }
    }

    impl ImageLoader for ManualLoader {
        fn request(&mut self, request: ImageRequest) {
            self.requests.push(request);
        }

        fn drain(&mut self) -> Vec<ImageLoadResult> {
            std::mem::take(&mut self.completed)
        }
    }

    const TWO_SCENE_TOUR: &str = r##"{
        "scenes": [
            {
                "id": "A", "name": "Atrium", "image": "a.jpg",
                "paths": [
                    { "color": "#ff0000", "type": "EL", "points": [[0,0,0],[0,10,0],[0,10,0],[5,10,0]] },
                    { "color": 255, "type": "WP", "points": [[1,-1,-4],[2,-1,-4]] }
                ],
                "hotspots": [ { "position": [0, 0, -10], "targetId": "B" } ]
            },
            {
                "id": "B", "name": "Balcony", "image": "b.jpg",
                "hotspots": [
                    { "position": [0, 0, -10], "targetId": "A" },
                    { "position": [0, 0, 10], "targetId": "A" },
                    { "position": [8, 0, -10], "targetId": "nowhere" }
                ]
            },
            { "id": "C", "name": "Cellar", "image": "c.jpg" }
        ]
    }"##;

    fn still_controls(config: &ViewerConfig) -> OrbitControls {
        let mut controls_config = config.controls.clone();
        controls_config.auto_rotate = false;
        OrbitControls::new(&controls_config, &config.camera)
    }

    fn viewer(config: ViewerConfig) -> (ViewerState, ManualLoader, OrbitControls) {
        let tour = parse_manifest(TWO_SCENE_TOUR, Path::new("/tour"), &config).expect("tour");
        let mut loader = ManualLoader::default();
        let controls = still_controls(&config);
        let state = ViewerState::with_tour(tour, config, &mut loader).expect("viewer");
        (state, loader, controls)
    }

    fn frame(
        state: &mut ViewerState,
        loader: &mut ManualLoader,
        controls: &mut OrbitControls,
    ) -> FrameStats {
        state.tick(loader, controls, 1.0 / 60.0, Viewport::new(800.0, 600.0))
    }

    fn panorama_source(state: &ViewerState) -> Option<PathBuf> {
        state
            .graph()
            .panorama()
            .map(|(_, panorama)| panorama.image.source.clone())
    }

    #[test]
    fn first_scene_attaches_one_panorama_and_all_markers() {
        let (mut state, mut loader, mut controls) = viewer(ViewerConfig::default());
        assert_eq!(loader.requests.len(), 1);
        assert_eq!(loader.requests[0].path, PathBuf::from("/tour/a.jpg"));
        assert!(state.is_loading());
        assert!(state.graph().is_empty());

        loader.succeed(loader.last_token());
        let stats = frame(&mut state, &mut loader, &mut controls);

        assert!(!stats.loading);
        assert_eq!(state.graph().panorama_count(), 1);
        assert_eq!(stats.marker_count, state.current_scene().hotspots.len());
        // Four points with one duplicate: two real segments, plus one from the second path.
        assert_eq!(stats.segment_count, 3);
        assert_eq!(state.displayed_scene(), Some(0));
        assert_eq!(
            state.graph().panorama().map(|(_, p)| p.radius),
            Some(50.0)
        );
    }

    #[test]
    fn transition_leaves_nothing_from_the_previous_scene() {
        let (mut state, mut loader, mut controls) = viewer(ViewerConfig::default());
        loader.succeed(loader.last_token());
        frame(&mut state, &mut loader, &mut controls);
        assert_eq!(state.graph().owners(), BTreeSet::from([0]));

        state.transition_to(1, &mut loader).expect("scene B");
        // Detached before the new image is even requested to resolve.
        assert!(state.graph().is_empty());
        assert_eq!(state.displayed_scene(), None);

        loader.succeed(loader.last_token());
        let stats = frame(&mut state, &mut loader, &mut controls);
        assert_eq!(state.graph().owners(), BTreeSet::from([1]));
        assert_eq!(stats.segment_count, 0);
        assert_eq!(stats.marker_count, 3);
        assert_eq!(panorama_source(&state), Some(PathBuf::from("/tour/b.jpg")));
    }

    #[test]
    fn clicking_hotspots_round_trips_between_scenes() {
        let (mut state, mut loader, mut controls) = viewer(ViewerConfig::default());
        loader.succeed(loader.last_token());
        frame(&mut state, &mut loader, &mut controls);

        // Scene A's only hotspot sits straight ahead, in the middle of the viewport.
        let token = state
            .click(400.0, 300.0, &mut loader)
            .expect("hotspot resolves")
            .expect("hotspot under cursor");
        assert_eq!(state.current_scene().id, "B");
        loader.succeed(token);
        frame(&mut state, &mut loader, &mut controls);
        assert_eq!(panorama_source(&state), Some(PathBuf::from("/tour/b.jpg")));

        let token = state
            .click(401.0, 299.0, &mut loader)
            .expect("hotspot resolves")
            .expect("hotspot under cursor");
        loader.succeed(token);
        frame(&mut state, &mut loader, &mut controls);

        assert_eq!(state.current_scene().id, "A");
        assert_eq!(panorama_source(&state), Some(PathBuf::from("/tour/a.jpg")));
        assert_eq!(state.graph().panorama_count(), 1);
    }

    #[test]
    fn clicking_empty_space_does_nothing() {
        let (mut state, mut loader, mut controls) = viewer(ViewerConfig::default());
        loader.succeed(loader.last_token());
        frame(&mut state, &mut loader, &mut controls);
        assert_eq!(state.click(20.0, 20.0, &mut loader), Ok(None));
        assert_eq!(loader.requests.len(), 1);
    }

    #[test]
    fn markers_behind_the_camera_are_not_clickable() {
        let (mut state, mut loader, mut controls) = viewer(ViewerConfig::default());
        state.transition_to(1, &mut loader).expect("scene B");
        loader.succeed(loader.last_token());
        let stats = frame(&mut state, &mut loader, &mut controls);
        assert_eq!(stats.marker_count, 3);
        // The hotspot at +Z is behind the eye.
        assert_eq!(stats.visible_markers, 2);
        let behind = state
            .graph()
            .markers()
            .find(|(_, marker)| marker.position == Vec3::new(0.0, 0.0, 10.0))
            .map(|(_, marker)| marker.screen.expect("projected"))
            .expect("marker");
        assert!(!behind.visible);
    }

    #[test]
    fn unresolved_hotspot_target_keeps_the_current_scene() {
        let (mut state, mut loader, mut controls) = viewer(ViewerConfig::default());
        state.transition_to(1, &mut loader).expect("scene B");
        loader.succeed(loader.last_token());
        frame(&mut state, &mut loader, &mut controls);

        let dangling = state
            .graph()
            .markers()
            .find(|(_, marker)| marker.target_id == "nowhere")
            .map(|(id, marker)| {
                assert_eq!(marker.target_index, None);
                id
            })
            .expect("dangling marker");
        let requests_before = loader.requests.len();
        let err = state
            .activate_marker(dangling, &mut loader)
            .expect_err("unknown target");
        assert_eq!(err, SceneNotFoundError::Id("nowhere".into()));
        assert_eq!(state.current_scene().id, "B");
        assert_eq!(loader.requests.len(), requests_before);
        assert_eq!(state.graph().panorama_count(), 1);
    }

    #[test]
    fn out_of_range_index_is_rejected_without_side_effects() {
        let (mut state, mut loader, mut controls) = viewer(ViewerConfig::default());
        loader.succeed(loader.last_token());
        frame(&mut state, &mut loader, &mut controls);
        let panorama_before = state.graph().panorama().map(|(id, _)| id);

        let err = state.transition_to(9, &mut loader).expect_err("out of range");
        assert_eq!(err, SceneNotFoundError::Index { index: 9, count: 3 });
        assert_eq!(state.graph().panorama().map(|(id, _)| id), panorama_before);
        assert_eq!(state.current_scene_index(), 0);
        assert_eq!(loader.requests.len(), 1);
        assert!(!state.is_loading());

        assert_eq!(
            state.transition_to_id("Z", &mut loader),
            Err(SceneNotFoundError::Id("Z".into()))
        );
    }

    #[test]
    fn failed_image_keeps_ticking_without_a_panorama() {
        let (mut state, mut loader, mut controls) = viewer(ViewerConfig::default());
        loader.fail(loader.last_token());
        let stats = frame(&mut state, &mut loader, &mut controls);

        assert!(matches!(stats.outcomes.as_slice(), [LoadOutcome::Failed(_)]));
        assert!(!stats.panorama_attached);
        assert_eq!(state.graph().panorama_count(), 0);
        let err = state.last_error().expect("error recorded");
        assert_eq!(err.scene_id, "A");
        assert_eq!(err.path, PathBuf::from("/tour/a.jpg"));
        // Overlays stay so the user can still navigate away.
        assert_eq!(stats.marker_count, 1);

        for _ in 0..5 {
            let stats = frame(&mut state, &mut loader, &mut controls);
            assert!(!stats.panorama_attached);
        }
        state.transition_to(1, &mut loader).expect("scene B");
        assert!(state.last_error().is_none());
    }

    #[test]
    fn superseded_loads_never_attach() {
        let (mut state, mut loader, mut controls) = viewer(ViewerConfig::default());
        let first = loader.last_token();
        let to_b = state.transition_to(1, &mut loader).expect("scene B");
        let to_c = state.transition_to(2, &mut loader).expect("scene C");
        assert!(first < to_b && to_b < to_c);

        // Older loads finish last and out of order.
        loader.succeed(to_c);
        loader.succeed(first);
        loader.succeed(to_b);
        let stats = frame(&mut state, &mut loader, &mut controls);

        assert_eq!(
            stats.outcomes,
            vec![
                LoadOutcome::Attached {
                    scene_index: 2,
                    token: to_c
                },
                LoadOutcome::Stale { token: first },
                LoadOutcome::Stale { token: to_b },
            ]
        );
        assert_eq!(state.graph().owners(), BTreeSet::from([2]));
        assert_eq!(panorama_source(&state), Some(PathBuf::from("/tour/c.jpg")));
    }

    #[test]
    fn scene_cycling_wraps_around() {
        let (mut state, mut loader, _) = viewer(ViewerConfig::default());
        state.previous_scene(&mut loader).expect("wrap backwards");
        assert_eq!(state.current_scene().id, "C");
        state.next_scene(&mut loader).expect("wrap forwards");
        assert_eq!(state.current_scene().id, "A");
    }

    #[test]
    fn world_scale_applies_to_paths_and_hotspots() {
        let config = ViewerConfig {
            world_scale: 2.0,
            ..ViewerConfig::default()
        };
        let (mut state, mut loader, mut controls) = viewer(config);
        loader.succeed(loader.last_token());
        frame(&mut state, &mut loader, &mut controls);

        let vertical = state
            .graph()
            .segments()
            .find(|segment| segment.layer.as_deref() == Some("EL"))
            .expect("EL segment");
        assert!((vertical.primitive.length - 20.0).abs() < 1e-4);
        assert!((vertical.primitive.midpoint - Vec3::new(0.0, 10.0, 0.0)).length() < 1e-4);
        let marker = state.graph().markers().next().map(|(_, m)| m.position);
        assert_eq!(marker, Some(Vec3::new(0.0, 0.0, -20.0)));
    }

    #[test]
    fn layer_toggles_hide_segments_across_transitions() {
        let (mut state, mut loader, mut controls) = viewer(ViewerConfig::default());
        assert!(!state.toggle_layer("EL"));
        loader.succeed(loader.last_token());
        frame(&mut state, &mut loader, &mut controls);
        assert_eq!(state.graph().segment_count(), 3);
        assert_eq!(state.graph().visible_segments().count(), 1);
        assert!(state.toggle_layer("EL"));
        assert_eq!(state.graph().visible_segments().count(), 3);
    }

    #[test]
    fn hover_highlights_only_the_marker_under_the_cursor() {
        let (mut state, mut loader, mut controls) = viewer(ViewerConfig::default());
        loader.succeed(loader.last_token());
        frame(&mut state, &mut loader, &mut controls);

        let hit = state.hover(402.0, 300.0).expect("marker under cursor");
        assert!(state.graph().marker(hit).expect("marker").hovered);
        assert_eq!(state.hover(10.0, 10.0), None);
        assert!(!state.graph().marker(hit).expect("marker").hovered);
    }

    #[test]
    fn hover_follows_the_camera_while_the_cursor_rests() {
        let mut config = ViewerConfig::default();
        config.controls.damping = 0.0;
        let (mut state, mut loader, mut controls) = viewer(config);
        controls.set_viewport_height(600.0);
        loader.succeed(loader.last_token());
        frame(&mut state, &mut loader, &mut controls);

        let hit = state.hover(400.0, 300.0).expect("marker under cursor");
        let hovered = |state: &ViewerState| state.graph().marker(hit).expect("marker").hovered;
        assert!(hovered(&state));

        controls.begin_drag(400.0, 300.0);
        controls.drag_to(430.0, 300.0);
        controls.end_drag();
        frame(&mut state, &mut loader, &mut controls);
        assert_eq!(state.marker_at(400.0, 300.0), None);
        assert!(!hovered(&state));

        controls.begin_drag(430.0, 300.0);
        controls.drag_to(400.0, 300.0);
        controls.end_drag();
        frame(&mut state, &mut loader, &mut controls);
        assert!(hovered(&state));

        state.clear_hover();
        assert!(!hovered(&state));
        frame(&mut state, &mut loader, &mut controls);
        assert!(!hovered(&state));
    }
}
