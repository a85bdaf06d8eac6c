//! Retained render graph for the currently displayed scene. The scene manager
//! attaches and detaches nodes; the renderer only reads. Every node records the
//! scene that owns it so transitions can be checked for leftovers.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use glam::Vec3;

use crate::geometry::SegmentPrimitive;
use crate::loader::PanoramaImage;
use crate::projection::ScreenPoint;
use crate::tour::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct PanoramaNode {
    pub image: Arc<PanoramaImage>,
    pub radius: f32,
}

#[derive(Debug, Clone)]
pub struct SegmentNode {
    pub primitive: SegmentPrimitive,
    pub color: Color,
    pub layer: Option<String>,
    pub path_index: usize,
}

#[derive(Debug, Clone)]
pub struct MarkerNode {
    pub hotspot_index: usize,
    pub position: Vec3,
    pub target_id: String,
    pub target_index: Option<usize>,
    pub label: Option<String>,
    /// Refreshed every frame by the scene manager.
    pub screen: Option<ScreenPoint>,
    pub hovered: bool,
}

impl MarkerNode {
    pub fn visible_screen(&self) -> Option<ScreenPoint> {
        self.screen.filter(|screen| screen.visible)
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Panorama(PanoramaNode),
    PathSegment(SegmentNode),
    HotspotMarker(MarkerNode),
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub scene_index: usize,
    pub kind: NodeKind,
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, SceneNode>,
    next_id: u64,
    hidden_layers: BTreeSet<String>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn attach(&mut self, scene_index: usize, kind: NodeKind) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.nodes.insert(id, SceneNode { scene_index, kind });
        id
    }

    /// Replaces any existing panorama so at most one is ever attached.
    pub fn attach_panorama(&mut self, scene_index: usize, panorama: PanoramaNode) -> NodeId {
        if let Some((existing, _)) = self.panorama() {
            self.detach(existing);
        }
        self.attach(scene_index, NodeKind::Panorama(panorama))
    }

    pub fn detach(&mut self, id: NodeId) -> Option<SceneNode> {
        self.nodes.remove(&id)
    }

    /// Detaches every node, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.nodes.len();
        self.nodes.clear();
        removed
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn panorama(&self) -> Option<(NodeId, &PanoramaNode)> {
        self.nodes.iter().find_map(|(id, node)| match &node.kind {
            NodeKind::Panorama(panorama) => Some((*id, panorama)),
            _ => None,
        })
    }

    pub fn panorama_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|node| matches!(node.kind, NodeKind::Panorama(_)))
            .count()
    }

    pub fn segments(&self) -> impl Iterator<Item = &SegmentNode> {
        self.nodes.values().filter_map(|node| match &node.kind {
            NodeKind::PathSegment(segment) => Some(segment),
            _ => None,
        })
    }

    /// Segments whose layer is not hidden.
    pub fn visible_segments(&self) -> impl Iterator<Item = &SegmentNode> {
        self.segments().filter(|segment| {
            segment
                .layer
                .as_ref()
                .map_or(true, |layer| !self.hidden_layers.contains(layer))
        })
    }

    pub fn segment_count(&self) -> usize {
        self.segments().count()
    }

    pub fn markers(&self) -> impl Iterator<Item = (NodeId, &MarkerNode)> {
        self.nodes.iter().filter_map(|(id, node)| match &node.kind {
            NodeKind::HotspotMarker(marker) => Some((*id, marker)),
            _ => None,
        })
    }

    pub fn markers_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut MarkerNode)> {
        self.nodes.iter_mut().filter_map(|(id, node)| match &mut node.kind {
            NodeKind::HotspotMarker(marker) => Some((*id, marker)),
            _ => None,
        })
    }

    pub fn marker(&self, id: NodeId) -> Option<&MarkerNode> {
        match &self.nodes.get(&id)?.kind {
            NodeKind::HotspotMarker(marker) => Some(marker),
            _ => None,
        }
    }

    pub fn marker_count(&self) -> usize {
        self.markers().count()
    }

    /// Scene indices that currently own at least one node.
    pub fn owners(&self) -> BTreeSet<usize> {
        self.nodes.values().map(|node| node.scene_index).collect()
    }

    pub fn set_layer_visible(&mut self, layer: &str, visible: bool) {
        if visible {
            self.hidden_layers.remove(layer);
        } else {
            self.hidden_layers.insert(layer.to_string());
        }
    }

    pub fn is_layer_visible(&self, layer: &str) -> bool {
        !self.hidden_layers.contains(layer)
    }
}
