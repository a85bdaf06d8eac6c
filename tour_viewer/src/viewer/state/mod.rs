//! GPU side of the viewer. Owns the wgpu device and surface plus the
//! pipelines for the three passes: the textured panorama sphere, the instanced
//! path segment cylinders, and the screen-space hotspot markers. It only reads
//! the `tour_core` scene graph; all scene mutation happens in `ViewerState`.
//! Submodules split the lifecycle: `init` for setup, `layout` for resize
//! handling, and `render` for the per-frame passes.

use std::sync::Arc;

use anyhow::Result;
use tour_core::{NodeId, ViewerConfig, ViewerState, Viewport};
use wgpu::SurfaceError;
use winit::{dpi::PhysicalSize, window::Window};

mod init;
mod layout;
mod render;

pub struct RenderState {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    background: wgpu::Color,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    panorama: PanoramaResources,
    segments: SegmentResources,
    markers: MarkerResources,
    path_radius: f32,
    marker_radius_px: f32,
}

struct PrimitiveBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

struct PanoramaResources {
    pipeline: wgpu::RenderPipeline,
    sphere: PrimitiveBuffers,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    texture: Option<PanoramaTexture>,
    /// Graph node whose image was last uploaded (or rejected).
    uploaded_node: Option<NodeId>,
}

struct PanoramaTexture {
    _texture: wgpu::Texture,
    _view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

struct SegmentResources {
    pipeline: wgpu::RenderPipeline,
    cylinder: PrimitiveBuffers,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    _depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
}

struct MarkerResources {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    capacity: usize,
}

impl RenderState {
    pub async fn new(window: Arc<Window>, config: &ViewerConfig) -> Result<Self> {
        init::new(window, config).await
    }

    pub fn window(&self) -> &Window {
        self.window.as_ref()
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn viewport(&self) -> Viewport {
        layout::viewport(self)
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        layout::resize(self, new_size);
    }

    pub fn render(&mut self, viewer: &ViewerState) -> Result<(), SurfaceError> {
        render::render(self, viewer)
    }
}
