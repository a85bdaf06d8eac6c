use bytemuck::{Pod, Zeroable};
use tour_core::{MarkerNode, SceneGraph, Viewport};

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(super) struct MarkerVertex {
    pub position: [f32; 2],
}

#[repr(C, align(16))]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(super) struct MarkerInstance {
    pub translate: [f32; 2],
    pub size: [f32; 2],
    pub color: [f32; 3],
    pub highlight: f32,
}

#[derive(Clone, Copy)]
pub(super) struct MarkerPalette {
    pub color: [f32; 3],
    pub highlight: f32,
}

pub(super) const HOTSPOT_PALETTE: MarkerPalette = MarkerPalette {
    color: [0.98, 0.86, 0.32],
    highlight: 0.0,
};
pub(super) const HOTSPOT_HOVER_PALETTE: MarkerPalette = MarkerPalette {
    color: [1.0, 0.95, 0.6],
    highlight: 1.0,
};
pub(super) const HOTSPOT_UNRESOLVED_PALETTE: MarkerPalette = MarkerPalette {
    color: [0.55, 0.55, 0.58],
    highlight: 0.0,
};

pub(super) const MARKER_VERTICES: [MarkerVertex; 6] = [
    MarkerVertex {
        position: [-0.5, -0.5],
    },
    MarkerVertex {
        position: [0.5, -0.5],
    },
    MarkerVertex {
        position: [-0.5, 0.5],
    },
    MarkerVertex {
        position: [-0.5, 0.5],
    },
    MarkerVertex {
        position: [0.5, -0.5],
    },
    MarkerVertex {
        position: [0.5, 0.5],
    },
];

pub(super) fn marker_palette(marker: &MarkerNode) -> MarkerPalette {
    if marker.target_index.is_none() {
        HOTSPOT_UNRESOLVED_PALETTE
    } else if marker.hovered {
        HOTSPOT_HOVER_PALETTE
    } else {
        HOTSPOT_PALETTE
    }
}

/// Pixel coordinates (origin top-left, y down) to clip space.
pub(super) fn pixel_to_clip(x: f32, y: f32, viewport: Viewport) -> Option<[f32; 2]> {
    if viewport.width <= 0.0 || viewport.height <= 0.0 {
        return None;
    }
    Some([
        x / viewport.width * 2.0 - 1.0,
        1.0 - y / viewport.height * 2.0,
    ])
}

/// Screen-space quads for every hotspot marker currently on screen. Markers
/// are sized in pixels so they stay the same size at any zoom.
pub(super) fn marker_instances(
    graph: &SceneGraph,
    viewport: Viewport,
    radius_px: f32,
) -> Vec<MarkerInstance> {
    if viewport.width <= 0.0 || viewport.height <= 0.0 {
        return Vec::new();
    }
    let size = [
        radius_px * 4.0 / viewport.width,
        radius_px * 4.0 / viewport.height,
    ];
    graph
        .markers()
        .filter_map(|(_, marker)| {
            let screen = marker.visible_screen()?;
            let translate = pixel_to_clip(screen.x, screen.y, viewport)?;
            let palette = marker_palette(marker);
            Some(MarkerInstance {
                translate,
                size,
                color: palette.color,
                highlight: palette.highlight,
            })
        })
        .collect()
}

#[cfg(test)]
mod marker_layout_tests {
    use super::*;
    use glam::Vec3;
    use tour_core::{NodeKind, ScreenPoint};

    fn marker(screen: Option<ScreenPoint>, target_index: Option<usize>) -> NodeKind {
        NodeKind::HotspotMarker(MarkerNode {
            hotspot_index: 0,
            position: Vec3::NEG_Z,
            target_id: "next".into(),
            target_index,
            label: None,
            screen,
            hovered: false,
        })
    }

    fn on_screen(x: f32, y: f32) -> Option<ScreenPoint> {
        Some(ScreenPoint {
            x,
            y,
            depth: 0.5,
            visible: true,
        })
    }

    #[test]
    fn pixel_corners_map_to_clip_corners() {
        let viewport = Viewport::new(800.0, 600.0);
        assert_eq!(pixel_to_clip(0.0, 0.0, viewport), Some([-1.0, 1.0]));
        assert_eq!(pixel_to_clip(800.0, 600.0, viewport), Some([1.0, -1.0]));
        assert_eq!(pixel_to_clip(400.0, 300.0, viewport), Some([0.0, 0.0]));
        assert_eq!(pixel_to_clip(1.0, 1.0, Viewport::new(0.0, 0.0)), None);
    }

    #[test]
    fn only_visible_markers_become_instances() {
        let mut graph = SceneGraph::new();
        graph.attach(0, marker(on_screen(400.0, 300.0), Some(1)));
        graph.attach(
            0,
            marker(
                Some(ScreenPoint {
                    x: 400.0,
                    y: 300.0,
                    depth: 2.0,
                    visible: false,
                }),
                Some(1),
            ),
        );
        graph.attach(0, marker(None, Some(1)));

        let instances = marker_instances(&graph, Viewport::new(800.0, 600.0), 14.0);
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].translate, [0.0, 0.0]);
        assert_eq!(instances[0].size, [56.0 / 800.0, 56.0 / 600.0]);
    }

    #[test]
    fn palette_reflects_hover_and_dangling_targets() {
        let mut graph = SceneGraph::new();
        let hovered = graph.attach(0, marker(on_screen(10.0, 10.0), Some(1)));
        graph.attach(0, marker(on_screen(20.0, 20.0), None));
        for (id, node) in graph.markers_mut() {
            node.hovered = id == hovered;
        }

        let instances = marker_instances(&graph, Viewport::new(100.0, 100.0), 10.0);
        assert_eq!(instances[0].color, HOTSPOT_HOVER_PALETTE.color);
        assert_eq!(instances[0].highlight, 1.0);
        assert_eq!(instances[1].color, HOTSPOT_UNRESOLVED_PALETTE.color);
    }
}
