use super::RenderState;
use super::init::create_depth_texture;
use tour_core::Viewport;
use winit::dpi::PhysicalSize;

pub(super) fn resize(state: &mut RenderState, new_size: PhysicalSize<u32>) {
    if new_size.width == 0 || new_size.height == 0 {
        return;
    }

    state.size = new_size;
    state.config.width = new_size.width;
    state.config.height = new_size.height;
    state.surface.configure(&state.device, &state.config);

    let (texture, view) = create_depth_texture(&state.device, new_size);
    state.segments._depth_texture = texture;
    state.segments.depth_view = view;
}

/// Viewport handed to the scene manager for projection and hit-testing.
pub(super) fn viewport(state: &RenderState) -> Viewport {
    Viewport::new(state.size.width as f32, state.size.height as f32)
}
