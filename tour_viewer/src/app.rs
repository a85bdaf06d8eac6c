//! Windowed front end: routes winit input into the scene manager and the orbit
//! controls, and drives one tick plus one render per redraw.

use std::time::Instant;

use tour_core::{OrbitControls, ThreadedImageLoader, ViewerState};
use wgpu::SurfaceError;
use winit::{dpi::PhysicalSize, keyboard::Key, window::Window};

use crate::input::{KeyAction, PointerState, key_action};
use crate::viewer::RenderState;

/// Longest frame step fed to the controls, so a stalled frame does not spin the view.
const MAX_FRAME_SECONDS: f32 = 0.25;

pub struct TourApp {
    viewer: ViewerState,
    loader: ThreadedImageLoader,
    controls: OrbitControls,
    render: RenderState,
    pointer: PointerState,
    layers: Vec<String>,
    last_frame: Instant,
    title: String,
}

impl TourApp {
    pub fn new(
        viewer: ViewerState,
        loader: ThreadedImageLoader,
        mut controls: OrbitControls,
        render: RenderState,
    ) -> Self {
        controls.set_viewport_height(render.size().height as f32);
        let layers = viewer.tour().layers();
        let mut app = Self {
            viewer,
            loader,
            controls,
            render,
            pointer: PointerState::default(),
            layers,
            last_frame: Instant::now(),
            title: String::new(),
        };
        app.refresh_title();
        app
    }

    pub fn window(&self) -> &Window {
        self.render.window()
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.render.size()
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.render.resize(new_size);
        self.controls.set_viewport_height(new_size.height as f32);
    }

    /// Returns `false` when the key asks the viewer to exit.
    pub fn handle_key(&mut self, key: &Key) -> bool {
        let Some(action) = key_action(key) else {
            return true;
        };
        match action {
            KeyAction::Exit => return false,
            KeyAction::ToggleAutoRotate => {
                let enabled = self.controls.toggle_auto_rotate();
                println!("Auto-rotate {}", if enabled { "on" } else { "off" });
            }
            KeyAction::NextScene => {
                if let Err(err) = self.viewer.next_scene(&mut self.loader) {
                    log::warn!("{err}");
                }
            }
            KeyAction::PreviousScene => {
                if let Err(err) = self.viewer.previous_scene(&mut self.loader) {
                    log::warn!("{err}");
                }
            }
            KeyAction::JumpToScene(index) => {
                if let Err(err) = self.viewer.transition_to(index, &mut self.loader) {
                    log::warn!("{err}");
                }
            }
            KeyAction::ToggleLayer(index) => match self.layers.get(index) {
                Some(layer) => {
                    let visible = self.viewer.toggle_layer(layer);
                    println!("Layer {layer}: {}", if visible { "shown" } else { "hidden" });
                }
                None => log::debug!("no path layer bound to F{}", index + 1),
            },
        }
        self.refresh_title();
        true
    }

    pub fn cursor_moved(&mut self, x: f32, y: f32) {
        self.pointer.moved_to(x, y);
        if self.controls.is_dragging() {
            self.controls.drag_to(x, y);
        }
        self.viewer.hover(x, y);
    }

    pub fn cursor_left(&mut self) {
        if self.pointer.is_pressed() {
            self.controls.end_drag();
        }
        self.pointer.left();
        self.viewer.clear_hover();
    }

    pub fn mouse_pressed(&mut self) {
        if let Some((x, y)) = self.pointer.press() {
            self.controls.begin_drag(x, y);
        }
    }

    /// Ends a drag; a release close to the press point activates the hotspot under it.
    pub fn mouse_released(&mut self) {
        self.controls.end_drag();
        let Some((x, y)) = self.pointer.release() else {
            return;
        };
        // The scene manager logs clicks on hotspots with no target scene.
        if let Ok(Some(_)) = self.viewer.click(x, y, &mut self.loader) {
            self.refresh_title();
        }
    }

    pub fn scroll(&mut self, steps: f32) {
        self.controls.zoom(steps);
    }

    pub fn redraw(&mut self) -> Result<(), SurfaceError> {
        let now = Instant::now();
        let dt = now
            .duration_since(self.last_frame)
            .as_secs_f32()
            .min(MAX_FRAME_SECONDS);
        self.last_frame = now;

        let viewport = self.render.viewport();
        let stats = self
            .viewer
            .tick(&mut self.loader, &mut self.controls, dt, viewport);
        if !stats.outcomes.is_empty() {
            self.refresh_title();
        }
        self.render.render(&self.viewer)
    }

    fn refresh_title(&mut self) {
        let scene = self.viewer.current_scene();
        let mut title = format!(
            "Tour Viewer - {} ({}/{})",
            scene.name,
            self.viewer.current_scene_index() + 1,
            self.viewer.tour().len()
        );
        if self.viewer.is_loading() {
            title.push_str(" - loading");
        } else if self.viewer.last_error().is_some() {
            title.push_str(" - image unavailable");
        }
        if title != self.title {
            self.render.window().set_title(&title);
            self.title = title;
        }
    }
}
