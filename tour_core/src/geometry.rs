//! Procedural geometry for the panorama sphere and path segments. Meshes are
//! produced as plain position/uv/index arrays so the renderer can pack them into
//! whatever vertex layout it uses.

use std::f32::consts::PI;

use glam::{Mat4, Quat, Vec3};

/// Default major axis of the segment primitive before rotation.
pub const SEGMENT_AXIS: Vec3 = Vec3::Y;

const MIN_SEGMENT_LENGTH: f32 = 1e-6;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// One straight piece of a path overlay, placed as a cylinder between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPrimitive {
    pub start: Vec3,
    pub end: Vec3,
    pub midpoint: Vec3,
    pub length: f32,
    pub direction: Vec3,
    /// Minimal rotation taking `SEGMENT_AXIS` onto `direction`.
    pub rotation: Quat,
}

impl SegmentPrimitive {
    pub fn axis(&self) -> Vec3 {
        self.rotation * SEGMENT_AXIS
    }

    /// Transform for a unit cylinder (height 1, radius 1, centred on the origin).
    pub fn model_matrix(&self, radius: f32) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::new(radius, self.length, radius),
            self.rotation,
            self.midpoint,
        )
    }
}

/// Returns `None` when the points coincide and no direction exists.
pub fn segment_between(start: Vec3, end: Vec3) -> Option<SegmentPrimitive> {
    let delta = end - start;
    let length = delta.length();
    if !length.is_finite() || length <= MIN_SEGMENT_LENGTH {
        return None;
    }
    let direction = delta / length;
    Some(SegmentPrimitive {
        start,
        end,
        midpoint: (start + end) * 0.5,
        length,
        direction,
        rotation: Quat::from_rotation_arc(SEGMENT_AXIS, direction),
    })
}

/// Sphere with the same topology as three.js `SphereGeometry`, mirrored on X
/// so front faces point at the centre and the texture reads correctly from
/// inside. UV (0,0) is the top-left of the equirectangular image.
pub fn build_panorama_sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let width = width_segments.max(3);
    let height = height_segments.max(2);
    let ring = (width + 1) as usize;
    let vertex_total = ring * (height + 1) as usize;

    let mut mesh = MeshData {
        positions: Vec::with_capacity(vertex_total),
        uvs: Vec::with_capacity(vertex_total),
        indices: Vec::with_capacity((width * height * 6) as usize),
    };

    for iy in 0..=height {
        let v = iy as f32 / height as f32;
        let theta = v * PI;
        for ix in 0..=width {
            let u = ix as f32 / width as f32;
            let phi = u * PI * 2.0;
            let x = -radius * phi.cos() * theta.sin();
            let y = radius * theta.cos();
            let z = radius * phi.sin() * theta.sin();
            mesh.positions.push([-x, y, z]);
            mesh.uvs.push([u, v]);
        }
    }

    for iy in 0..height as usize {
        for ix in 0..width as usize {
            let a = (iy * ring + ix + 1) as u32;
            let b = (iy * ring + ix) as u32;
            let c = ((iy + 1) * ring + ix) as u32;
            let d = ((iy + 1) * ring + ix + 1) as u32;
            if iy != 0 {
                mesh.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height as usize - 1 {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    mesh
}

/// Capped cylinder of height 1 and radius 1 along +Y, centred on the origin.
pub fn build_unit_cylinder(radial_segments: u32) -> MeshData {
    let segments = radial_segments.max(3);
    let mut mesh = MeshData::default();

    for ring in 0..=segments {
        let u = ring as f32 / segments as f32;
        let angle = u * PI * 2.0;
        let (sin, cos) = angle.sin_cos();
        mesh.positions.push([sin, 0.5, cos]);
        mesh.uvs.push([u, 0.0]);
        mesh.positions.push([sin, -0.5, cos]);
        mesh.uvs.push([u, 1.0]);
    }
    for ring in 0..segments {
        let top = ring * 2;
        let bottom = top + 1;
        let next_top = top + 2;
        let next_bottom = top + 3;
        mesh.indices
            .extend_from_slice(&[top, bottom, next_top, next_top, bottom, next_bottom]);
    }

    for (y, winding_up) in [(0.5_f32, true), (-0.5_f32, false)] {
        let centre = mesh.positions.len() as u32;
        mesh.positions.push([0.0, y, 0.0]);
        mesh.uvs.push([0.5, 0.5]);
        for ring in 0..segments {
            let angle = ring as f32 / segments as f32 * PI * 2.0;
            let (sin, cos) = angle.sin_cos();
            mesh.positions.push([sin, y, cos]);
            mesh.uvs.push([sin * 0.5 + 0.5, cos * 0.5 + 0.5]);
        }
        for ring in 0..segments {
            let current = centre + 1 + ring;
            let next = centre + 1 + (ring + 1) % segments;
            if winding_up {
                mesh.indices.extend_from_slice(&[centre, current, next]);
            } else {
                mesh.indices.extend_from_slice(&[centre, next, current]);
            }
        }
    }

    mesh
}


#[cfg(test)]
mod mesh_tests {
    use super::*;

    #[test]
    fn panorama_sphere_has_expected_topology() {
        let mesh = build_panorama_sphere(50.0, 64, 64);
        assert_eq!(mesh.vertex_count(), 65 * 65);
        assert_eq!(mesh.uvs.len(), mesh.vertex_count());
        // Pole rows contribute a single triangle per quad.
        assert_eq!(mesh.triangle_count(), 64 * 64 * 2 - 64 * 2);
        for position in &mesh.positions {
            let radius = Vec3::from_array(*position).length();
            assert!((radius - 50.0).abs() < 1e-3, "vertex off the sphere: {radius}");
        }
        let max_index = mesh.indices.iter().copied().max().expect("indices");
        assert!((max_index as usize) < mesh.vertex_count());
    }

    #[test]
    fn panorama_faces_point_inward() {
        let mesh = build_panorama_sphere(10.0, 16, 8);
        for tri in mesh.indices.chunks(3) {
            let a = Vec3::from_array(mesh.positions[tri[0] as usize]);
            let b = Vec3::from_array(mesh.positions[tri[1] as usize]);
            let c = Vec3::from_array(mesh.positions[tri[2] as usize]);
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) < 0.0, "triangle {tri:?} faces outward");
        }
    }

    #[test]
    fn unit_cylinder_spans_half_unit_each_way() {
        let mesh = build_unit_cylinder(8);
        let (min_y, max_y) = mesh
            .positions
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p[1]), hi.max(p[1])));
        assert_eq!(min_y, -0.5);
        assert_eq!(max_y, 0.5);
        assert_eq!(mesh.triangle_count(), 8 * 2 + 8 * 2);
    }
}
