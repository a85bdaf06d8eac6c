mod markers;
mod mesh;
mod shaders;
mod state;

pub use state::RenderState;
