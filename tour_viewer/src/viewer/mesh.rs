//! Vertex and instance layouts for the panorama sphere and the path segment
//! cylinders. Geometry comes from `tour_core::geometry`; this module only packs
//! it into GPU-friendly `Pod` structs.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use tour_core::{MeshData, SceneGraph};

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct PanoramaVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct SegmentVertex {
    pub position: [f32; 3],
}

/// Packed mesh ready for `create_buffer_init`.
pub struct MeshPrimitive<V> {
    pub vertices: Vec<V>,
    pub indices: Vec<u32>,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct MeshInstance {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct MeshUniforms {
    pub view_projection: [[f32; 4]; 4],
}

pub fn panorama_primitive(mesh: &MeshData) -> MeshPrimitive<PanoramaVertex> {
    let vertices = mesh
        .positions
        .iter()
        .zip(&mesh.uvs)
        .map(|(position, uv)| PanoramaVertex {
            position: *position,
            uv: *uv,
        })
        .collect();
    MeshPrimitive {
        vertices,
        indices: mesh.indices.clone(),
    }
}

pub fn segment_primitive(mesh: &MeshData) -> MeshPrimitive<SegmentVertex> {
    let vertices = mesh
        .positions
        .iter()
        .map(|position| SegmentVertex {
            position: *position,
        })
        .collect();
    MeshPrimitive {
        vertices,
        indices: mesh.indices.clone(),
    }
}

/// One instance per segment on a visible layer.
pub fn segment_instances(graph: &SceneGraph, path_radius: f32) -> Vec<MeshInstance> {
    graph
        .visible_segments()
        .map(|segment| {
            let [r, g, b] = segment.color.rgb();
            MeshInstance {
                model: to_matrix_columns(segment.primitive.model_matrix(path_radius)),
                color: [r, g, b, 1.0],
            }
        })
        .collect()
}

pub fn view_projection_uniform(matrix: Mat4) -> MeshUniforms {
    MeshUniforms {
        view_projection: to_matrix_columns(matrix),
    }
}

fn to_matrix_columns(matrix: Mat4) -> [[f32; 4]; 4] {
    let data = matrix.to_cols_array();
    [
        [data[0], data[1], data[2], data[3]],
        [data[4], data[5], data[6], data[7]],
        [data[8], data[9], data[10], data[11]],
        [data[12], data[13], data[14], data[15]],
    ]
}
