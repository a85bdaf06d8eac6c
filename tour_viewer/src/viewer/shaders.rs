pub(super) const PANORAMA_SHADER_SOURCE: &str = r#"
struct Uniforms {
    view_projection: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

@group(1) @binding(0)
var panorama_texture: texture_2d<f32>;
@group(1) @binding(1)
var panorama_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = uniforms.view_projection * vec4<f32>(input.position, 1.0);
    out.uv = input.uv;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let uv = vec2<f32>(fract(input.uv.x), clamp(input.uv.y, 0.0, 1.0));
    return textureSample(panorama_texture, panorama_sampler, uv);
}
"#;

pub(super) const SEGMENT_SHADER_SOURCE: &str = r#"
struct Uniforms {
    view_projection: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) radial: vec2<f32>,
};

@vertex
fn segment_vs_main(input: VertexInput) -> VertexOutput {
    let model = mat4x4<f32>(input.model_0, input.model_1, input.model_2, input.model_3);
    var out: VertexOutput;
    out.position = uniforms.view_projection * model * vec4<f32>(input.position, 1.0);
    out.color = input.color;
    out.radial = input.position.xz;
    return out;
}

@fragment
fn segment_fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    // Darken towards the silhouette so thin tubes still read as round.
    let edge = clamp(length(input.radial), 0.0, 1.0);
    let shade = 1.0 - edge * edge * 0.35;
    return vec4<f32>(input.color.rgb * shade, input.color.a);
}
"#;

pub(super) const MARKER_SHADER_SOURCE: &str = r#"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) local_pos: vec2<f32>,
    @location(2) highlight: f32,
};

struct VertexIn {
    @location(0) base_pos: vec2<f32>,
    @location(1) translate: vec2<f32>,
    @location(2) size: vec2<f32>,
    @location(3) color: vec3<f32>,
    @location(4) highlight: f32,
};

@vertex
fn vs_main(input: VertexIn) -> VertexOutput {
    let scale = input.size * (1.0 + input.highlight * 0.25);
    let position = input.base_pos * scale + input.translate;
    var out: VertexOutput;
    out.position = vec4<f32>(position, 0.0, 1.0);
    out.color = input.color;
    out.local_pos = input.base_pos;
    out.highlight = input.highlight;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let radius = length(input.local_pos) * 2.0;
    let inner = 1.0 - smoothstep(0.55, 0.8, radius);
    let border_band = smoothstep(0.7, 0.85, radius) * (1.0 - smoothstep(0.9, 1.0, radius));
    let glow = input.highlight;
    let base_color = mix(input.color, vec3<f32>(1.0, 1.0, 1.0), glow * 0.35);
    let rim_color = mix(vec3<f32>(0.1, 0.1, 0.12), vec3<f32>(1.0, 1.0, 0.85), glow);
    let color = base_color * inner + rim_color * border_band;
    let alpha = max(inner * 0.9, border_band);
    if alpha < 0.03 {
        discard;
    }
    return vec4<f32>(color, alpha);
}
"#;
