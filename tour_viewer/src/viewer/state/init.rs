use std::{borrow::Cow, sync::Arc};

use super::super::markers::{MARKER_VERTICES, MarkerInstance, MarkerVertex};
use super::super::mesh::{
    MeshInstance, MeshPrimitive, MeshUniforms, PanoramaVertex, SegmentVertex, panorama_primitive,
    segment_primitive, view_projection_uniform,
};
use super::super::shaders::{
    MARKER_SHADER_SOURCE, PANORAMA_SHADER_SOURCE, SEGMENT_SHADER_SOURCE,
};
use super::{
    MarkerResources, PanoramaResources, PanoramaTexture, PrimitiveBuffers, RenderState,
    SegmentResources,
};
use anyhow::{Context, Result, ensure};
use bytemuck::{Pod, cast_slice};
use glam::Mat4;
use tour_core::{PanoramaImage, ViewerConfig, build_panorama_sphere, build_unit_cylinder};
use wgpu::util::DeviceExt;
use winit::{dpi::PhysicalSize, window::Window};

use crate::texture::prepare_rgba_upload;

/// Bundles the wgpu objects tied to the viewer window.
struct WgpuBootstrap {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    present_mode: wgpu::PresentMode,
    alpha_mode: wgpu::CompositeAlphaMode,
}

/// View-projection uniform shared by the panorama and segment pipelines.
struct UniformResources {
    layout: wgpu::BindGroupLayout,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.025,
    a: 1.0,
};

/// Bootstraps wgpu and builds every pipeline and static buffer up front so
/// frame rendering only uploads instances, uniforms, and new panoramas.
pub(super) async fn new(window: Arc<Window>, config: &ViewerConfig) -> Result<RenderState> {
    let size = window.inner_size();
    let wgpu = bootstrap_wgpu(window.clone()).await?;

    let max_side = wgpu.device.limits().max_texture_dimension_2d;
    if config.max_texture_side > max_side {
        log::warn!(
            "max_texture_side {} exceeds the adapter limit {max_side}; larger panoramas will be skipped",
            config.max_texture_side
        );
    }

    let uniforms = create_uniforms(&wgpu.device);
    let panorama = create_panorama_resources(
        &wgpu.device,
        &uniforms.layout,
        wgpu.surface_format,
        config,
    );
    let segments = create_segment_resources(
        &wgpu.device,
        &uniforms.layout,
        wgpu.surface_format,
        size,
        config,
    );
    let markers = create_marker_resources(&wgpu.device, wgpu.surface_format);

    log::info!(
        "renderer ready: {}x{} surface {:?}, sphere {} triangles, cylinder {} triangles",
        size.width,
        size.height,
        wgpu.surface_format,
        panorama.sphere.index_count / 3,
        segments.cylinder.index_count / 3
    );

    let state = RenderState {
        window,
        surface: wgpu.surface,
        device: wgpu.device,
        queue: wgpu.queue,
        config: wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: wgpu.surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu.present_mode,
            alpha_mode: wgpu.alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 1,
        },
        size,
        background: BACKGROUND,
        uniform_buffer: uniforms.buffer,
        uniform_bind_group: uniforms.bind_group,
        panorama,
        segments,
        markers,
        path_radius: config.path_radius,
        marker_radius_px: config.marker_radius_px,
    };
    state.surface.configure(&state.device, &state.config);
    Ok(state)
}

async fn bootstrap_wgpu(window: Arc<Window>) -> Result<WgpuBootstrap> {
    let instance = wgpu::Instance::default();
    let surface = instance
        .create_surface(window.clone())
        .context("creating wgpu surface")?;

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        })
        .await
        .context("requesting wgpu adapter")?;

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("tour-viewer-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
            },
            None,
        )
        .await
        .context("requesting wgpu device")?;

    let surface_caps = surface.get_capabilities(&adapter);
    let surface_format = surface_caps
        .formats
        .iter()
        .copied()
        .find(|format| format.is_srgb())
        .or_else(|| surface_caps.formats.first().copied())
        .context("surface reports no supported formats")?;
    let present_mode = surface_caps
        .present_modes
        .iter()
        .copied()
        .find(|mode| *mode == wgpu::PresentMode::Mailbox)
        .unwrap_or(wgpu::PresentMode::Fifo);
    let alpha_mode = surface_caps
        .alpha_modes
        .first()
        .copied()
        .unwrap_or(wgpu::CompositeAlphaMode::Opaque);

    Ok(WgpuBootstrap {
        surface,
        device,
        queue,
        surface_format,
        present_mode,
        alpha_mode,
    })
}

fn create_uniforms(device: &wgpu::Device) -> UniformResources {
    let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("view-uniform-layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<MeshUniforms>() as u64),
            },
            count: None,
        }],
    });

    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("view-uniform-buffer"),
        contents: cast_slice(&[view_projection_uniform(Mat4::IDENTITY)]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("view-uniform-bind-group"),
        layout: &layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    });

    UniformResources {
        layout,
        buffer,
        bind_group,
    }
}

fn create_panorama_resources(
    device: &wgpu::Device,
    uniform_layout: &wgpu::BindGroupLayout,
    surface_format: wgpu::TextureFormat,
    config: &ViewerConfig,
) -> PanoramaResources {
    let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("panorama-bind-group-layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    });

    // Longitude wraps; latitude stops at the poles.
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("panorama-sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("panorama-shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(PANORAMA_SHADER_SOURCE)),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("panorama-pipeline-layout"),
        bind_group_layouts: &[uniform_layout, &texture_layout],
        push_constant_ranges: &[],
    });

    let vertex_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<PanoramaVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
    };

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("panorama-pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: "vs_main",
            buffers: &[vertex_layout],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        // Viewed from inside; both windings are drawn.
        primitive: wgpu::PrimitiveState {
            cull_mode: None,
            ..wgpu::PrimitiveState::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    });

    let sphere_mesh = build_panorama_sphere(
        config.sphere_radius,
        config.sphere_width_segments,
        config.sphere_height_segments,
    );
    let sphere = upload_primitive(device, "panorama-sphere", panorama_primitive(&sphere_mesh));

    PanoramaResources {
        pipeline,
        sphere,
        texture_layout,
        sampler,
        texture: None,
        uploaded_node: None,
    }
}

fn create_segment_resources(
    device: &wgpu::Device,
    uniform_layout: &wgpu::BindGroupLayout,
    surface_format: wgpu::TextureFormat,
    size: PhysicalSize<u32>,
    config: &ViewerConfig,
) -> SegmentResources {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("segment-shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(SEGMENT_SHADER_SOURCE)),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("segment-pipeline-layout"),
        bind_group_layouts: &[uniform_layout],
        push_constant_ranges: &[],
    });

    let vertex_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<SegmentVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3],
    };

    let instance_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshInstance>() as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x4,
            },
            wgpu::VertexAttribute {
                offset: 16,
                shader_location: 3,
                format: wgpu::VertexFormat::Float32x4,
            },
            wgpu::VertexAttribute {
                offset: 32,
                shader_location: 4,
                format: wgpu::VertexFormat::Float32x4,
            },
            wgpu::VertexAttribute {
                offset: 48,
                shader_location: 5,
                format: wgpu::VertexFormat::Float32x4,
            },
            wgpu::VertexAttribute {
                offset: 64,
                shader_location: 6,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("segment-pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: "segment_vs_main",
            buffers: &[vertex_layout, instance_layout],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: "segment_fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            cull_mode: None,
            ..wgpu::PrimitiveState::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    });

    let cylinder_mesh = build_unit_cylinder(config.path_radial_segments);
    let cylinder = upload_primitive(device, "segment-cylinder", segment_primitive(&cylinder_mesh));

    let initial_capacity = 32usize;
    let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("segment-instance-buffer"),
        size: (initial_capacity * std::mem::size_of::<MeshInstance>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let (depth_texture, depth_view) = create_depth_texture(device, size);

    SegmentResources {
        pipeline,
        cylinder,
        instance_buffer,
        instance_capacity: initial_capacity,
        _depth_texture: depth_texture,
        depth_view,
    }
}

fn create_marker_resources(
    device: &wgpu::Device,
    surface_format: wgpu::TextureFormat,
) -> MarkerResources {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("marker-shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(MARKER_SHADER_SOURCE)),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("marker-pipeline-layout"),
        bind_group_layouts: &[],
        push_constant_ranges: &[],
    });

    let vertex_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MarkerVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x2],
    };

    let instance_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MarkerInstance>() as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
            wgpu::VertexAttribute {
                offset: 8,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
            wgpu::VertexAttribute {
                offset: 16,
                shader_location: 3,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 28,
                shader_location: 4,
                format: wgpu::VertexFormat::Float32,
            },
        ],
    };

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("marker-pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: "vs_main",
            buffers: &[vertex_layout, instance_layout],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    });

    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("marker-vertex-buffer"),
        contents: cast_slice(&MARKER_VERTICES),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let initial_capacity = 8usize;
    let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("marker-instance-buffer"),
        size: (initial_capacity * std::mem::size_of::<MarkerInstance>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    MarkerResources {
        pipeline,
        vertex_buffer,
        instance_buffer,
        capacity: initial_capacity,
    }
}

fn upload_primitive<V: Pod>(
    device: &wgpu::Device,
    label: &str,
    primitive: MeshPrimitive<V>,
) -> PrimitiveBuffers {
    let vertex_label = format!("{label}-vertex-buffer");
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&vertex_label),
        contents: cast_slice(&primitive.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let index_label = format!("{label}-index-buffer");
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&index_label),
        contents: cast_slice(&primitive.indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    PrimitiveBuffers {
        vertex: vertex_buffer,
        index: index_buffer,
        index_count: primitive.indices.len() as u32,
    }
}

/// Upload a decoded panorama and bind it for the sphere pass.
pub(super) fn create_panorama_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    image: &PanoramaImage,
) -> Result<PanoramaTexture> {
    let max_side = device.limits().max_texture_dimension_2d;
    ensure!(
        image.width <= max_side && image.height <= max_side,
        "panorama {} is {}x{}, above the adapter limit of {max_side}px",
        image.source.display(),
        image.width,
        image.height
    );
    let upload = prepare_rgba_upload(image.width, image.height, &image.rgba)
        .with_context(|| format!("preparing upload of {}", image.source.display()))?;

    let texture_extent = wgpu::Extent3d {
        width: image.width,
        height: image.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("panorama-texture"),
        size: texture_extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        upload.pixels(),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(upload.bytes_per_row()),
            rows_per_image: Some(image.height),
        },
        texture_extent,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("panorama-bind-group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });

    Ok(PanoramaTexture {
        _texture: texture,
        _view: view,
        bind_group,
    })
}

pub(super) fn create_depth_texture(
    device: &wgpu::Device,
    size: PhysicalSize<u32>,
) -> (wgpu::Texture, wgpu::TextureView) {
    let extent = wgpu::Extent3d {
        width: size.width.max(1),
        height: size.height.max(1),
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("segment-depth-texture"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}
