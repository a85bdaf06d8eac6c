use super::super::markers::{MarkerInstance, marker_instances};
use super::super::mesh::{MeshInstance, segment_instances, view_projection_uniform};
use super::RenderState;
use super::init::create_panorama_texture;
use super::layout;
use bytemuck::cast_slice;
use glam::Mat4;
use tour_core::{SceneGraph, ViewerState};
use wgpu::SurfaceError;

pub(super) fn render(state: &mut RenderState, viewer: &ViewerState) -> Result<(), SurfaceError> {
    sync_panorama_texture(state, viewer.graph());

    let frame = state.surface.get_current_texture()?;
    let view = frame
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());
    let mut encoder = state
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("tour-viewer-encoder"),
        });

    let viewport = layout::viewport(state);
    let view_projection = viewer
        .camera()
        .projector(viewport.aspect_ratio())
        .map(|projector| projector.view_projection_matrix())
        .unwrap_or(Mat4::IDENTITY);
    state.queue.write_buffer(
        &state.uniform_buffer,
        0,
        cast_slice(&[view_projection_uniform(view_projection)]),
    );

    draw_panorama(state, &view, &mut encoder);
    draw_segments(state, viewer.graph(), &view, &mut encoder);
    draw_markers(state, viewer, &view, &mut encoder);

    state.queue.submit(std::iter::once(encoder.finish()));
    frame.present();
    Ok(())
}

/// Upload the attached panorama once per graph node; drop it when the graph
/// no longer has one.
fn sync_panorama_texture(state: &mut RenderState, graph: &SceneGraph) {
    let Some((node_id, panorama)) = graph.panorama() else {
        if state.panorama.uploaded_node.take().is_some() {
            state.panorama.texture = None;
        }
        return;
    };
    if state.panorama.uploaded_node == Some(node_id) {
        return;
    }

    state.panorama.uploaded_node = Some(node_id);
    match create_panorama_texture(
        &state.device,
        &state.queue,
        &state.panorama.texture_layout,
        &state.panorama.sampler,
        &panorama.image,
    ) {
        Ok(texture) => {
            log::debug!(
                "uploaded panorama {} ({}x{})",
                panorama.image.source.display(),
                panorama.image.width,
                panorama.image.height
            );
            state.panorama.texture = Some(texture);
        }
        Err(err) => {
            log::warn!("panorama upload failed: {err:#}");
            state.panorama.texture = None;
        }
    }
}

fn draw_panorama(
    state: &RenderState,
    view: &wgpu::TextureView,
    encoder: &mut wgpu::CommandEncoder,
) {
    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("panorama-pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(state.background),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    let Some(texture) = state.panorama.texture.as_ref() else {
        return;
    };
    let sphere = &state.panorama.sphere;
    rpass.set_pipeline(&state.panorama.pipeline);
    rpass.set_bind_group(0, &state.uniform_bind_group, &[]);
    rpass.set_bind_group(1, &texture.bind_group, &[]);
    rpass.set_vertex_buffer(0, sphere.vertex.slice(..));
    rpass.set_index_buffer(sphere.index.slice(..), wgpu::IndexFormat::Uint32);
    rpass.draw_indexed(0..sphere.index_count, 0, 0..1);
}

fn draw_segments(
    state: &mut RenderState,
    graph: &SceneGraph,
    view: &wgpu::TextureView,
    encoder: &mut wgpu::CommandEncoder,
) {
    let instances = segment_instances(graph, state.path_radius);
    if instances.is_empty() {
        return;
    }
    ensure_segment_instance_capacity(state, instances.len());
    let segments = &state.segments;
    state
        .queue
        .write_buffer(&segments.instance_buffer, 0, cast_slice(&instances));

    let mut mesh_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("segment-pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: &segments.depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
    });

    let instance_bytes = (instances.len() * std::mem::size_of::<MeshInstance>()) as u64;
    mesh_pass.set_pipeline(&segments.pipeline);
    mesh_pass.set_bind_group(0, &state.uniform_bind_group, &[]);
    mesh_pass.set_vertex_buffer(0, segments.cylinder.vertex.slice(..));
    mesh_pass.set_vertex_buffer(1, segments.instance_buffer.slice(0..instance_bytes));
    mesh_pass.set_index_buffer(segments.cylinder.index.slice(..), wgpu::IndexFormat::Uint32);
    mesh_pass.draw_indexed(
        0..segments.cylinder.index_count,
        0,
        0..instances.len() as u32,
    );
}

fn draw_markers(
    state: &mut RenderState,
    viewer: &ViewerState,
    view: &wgpu::TextureView,
    encoder: &mut wgpu::CommandEncoder,
) {
    // Screen positions were computed against the viewport of the last tick.
    let instances = marker_instances(viewer.graph(), viewer.viewport(), state.marker_radius_px);
    if instances.is_empty() {
        return;
    }
    ensure_marker_capacity(state, instances.len());
    let markers = &state.markers;
    state
        .queue
        .write_buffer(&markers.instance_buffer, 0, cast_slice(&instances));

    let mut marker_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("marker-pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    let instance_bytes = (instances.len() * std::mem::size_of::<MarkerInstance>()) as u64;
    marker_pass.set_pipeline(&markers.pipeline);
    marker_pass.set_vertex_buffer(0, markers.vertex_buffer.slice(..));
    marker_pass.set_vertex_buffer(1, markers.instance_buffer.slice(0..instance_bytes));
    marker_pass.draw(0..6, 0..instances.len() as u32);
}

/// Grow the segment instance buffer if the current frame needs more slots.
fn ensure_segment_instance_capacity(state: &mut RenderState, required: usize) {
    let segments = &mut state.segments;
    if required <= segments.instance_capacity {
        return;
    }
    let capacity = grown_capacity(segments.instance_capacity, required);
    let label = format!("segment-instance-buffer({capacity})");
    segments.instance_buffer = state.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label.as_str()),
        size: (capacity * std::mem::size_of::<MeshInstance>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    segments.instance_capacity = capacity;
}

fn ensure_marker_capacity(state: &mut RenderState, required: usize) {
    let markers = &mut state.markers;
    if required <= markers.capacity {
        return;
    }
    let capacity = grown_capacity(markers.capacity, required);
    let label = format!("marker-instance-buffer({capacity})");
    markers.instance_buffer = state.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label.as_str()),
        size: (capacity * std::mem::size_of::<MarkerInstance>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    markers.capacity = capacity;
}

fn grown_capacity(current: usize, required: usize) -> usize {
    let mut capacity = current.max(1);
    while capacity < required {
        capacity *= 2;
    }
    capacity
}
