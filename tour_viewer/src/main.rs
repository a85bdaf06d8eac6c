mod app;
mod cli;
mod headless;
mod input;
mod texture;
mod viewer;

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use pollster::FutureExt;
use tour_core::{OrbitControls, ThreadedImageLoader, ViewerState, Viewport};
use wgpu::SurfaceError;
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

use crate::app::TourApp;
use crate::cli::Args;
use crate::input::PIXELS_PER_ZOOM_STEP;
use crate::viewer::RenderState;

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::init();

    let config = args.viewer_config()?;
    let mut loader = ThreadedImageLoader::new(config.max_texture_side)?;
    let mut controls = OrbitControls::new(&config.controls, &config.camera);
    let mut viewer = ViewerState::load_tour(&args.manifest, config.clone(), &mut loader)
        .with_context(|| format!("loading tour manifest {}", args.manifest.display()))?;

    if let Some(scene_id) = args.start_scene.as_deref() {
        if let Err(err) = viewer.transition_to_id(scene_id, &mut loader) {
            log::warn!(
                "--start-scene {scene_id}: {err}; starting at '{}'",
                viewer.current_scene().id
            );
        }
    }
    hide_layers(&mut viewer, &args.hidden_layers);
    print_tour_overview(&viewer);

    if args.headless {
        let viewport = Viewport::new(args.width as f32, args.height as f32);
        let timeout = Duration::from_millis(args.headless_timeout_ms);
        return headless::run(&mut viewer, &mut loader, &mut controls, viewport, timeout);
    }
    print_controls_help(&viewer);

    let event_loop = EventLoop::new().context("creating winit event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(format!("Tour Viewer - {}", viewer.current_scene().name))
            .with_inner_size(PhysicalSize::new(args.width, args.height))
            .build(&event_loop)
            .context("creating viewer window")?,
    );

    let render = RenderState::new(window, &config).block_on()?;
    let mut app = TourApp::new(viewer, loader, controls, render);

    event_loop
        .run(move |event, target| {
            target.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { window_id, event } if window_id == app.window().id() => {
                    match event {
                        WindowEvent::CloseRequested => target.exit(),
                        WindowEvent::KeyboardInput {
                            event:
                                KeyEvent {
                                    logical_key,
                                    state: ElementState::Pressed,
                                    ..
                                },
                            ..
                        } => {
                            if !app.handle_key(&logical_key) {
                                target.exit();
                            }
                        }
                        WindowEvent::MouseInput {
                            state,
                            button: MouseButton::Left,
                            ..
                        } => match state {
                            ElementState::Pressed => app.mouse_pressed(),
                            ElementState::Released => app.mouse_released(),
                        },
                        WindowEvent::CursorMoved {
                            position: PhysicalPosition { x, y },
                            ..
                        } => app.cursor_moved(x as f32, y as f32),
                        WindowEvent::CursorLeft { .. } => app.cursor_left(),
                        WindowEvent::MouseWheel { delta, .. } => match delta {
                            MouseScrollDelta::LineDelta(_, y) => app.scroll(y),
                            MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => {
                                app.scroll(y as f32 / PIXELS_PER_ZOOM_STEP)
                            }
                        },
                        WindowEvent::Resized(new_size) => app.resize(new_size),
                        WindowEvent::RedrawRequested => match app.redraw() {
                            Ok(_) => {}
                            Err(SurfaceError::Lost) => app.resize(app.size()),
                            Err(SurfaceError::OutOfMemory) => target.exit(),
                            Err(err) => log::error!("render error: {err:?}"),
                        },
                        _ => {}
                    }
                }
                Event::AboutToWait => app.window().request_redraw(),
                _ => {}
            }
        })
        .context("running viewer application")?;
    Ok(())
}

fn hide_layers(viewer: &mut ViewerState, layers: &[String]) {
    let known = viewer.tour().layers();
    for layer in layers {
        if !known.contains(layer) {
            log::warn!("--hide-layer {layer}: no path in this tour uses that layer");
        }
        viewer.set_layer_visible(layer, false);
    }
}

fn print_tour_overview(viewer: &ViewerState) {
    let tour = viewer.tour();
    println!(
        "Tour: {} scene{} from {}",
        tour.len(),
        if tour.len() == 1 { "" } else { "s" },
        tour.base_dir().display()
    );
    for (index, scene) in tour.scenes().iter().enumerate() {
        let marker = if index == viewer.current_scene_index() {
            "*"
        } else {
            " "
        };
        println!(
            " {marker} [{}] {} ({}): {} path(s), {} hotspot(s)",
            index + 1,
            scene.id,
            scene.name,
            scene.paths.len(),
            scene.hotspots.len()
        );
    }
    for (scene_id, target_id) in tour.unresolved_hotspots() {
        println!("  warning: hotspot in '{scene_id}' points at unknown scene '{target_id}'");
    }
    let layers = tour.layers();
    if !layers.is_empty() {
        println!("Path layers: {}", layers.join(", "));
    }
}

fn print_controls_help(viewer: &ViewerState) {
    println!();
    println!("Drag to look around, scroll to zoom, click a hotspot to move to its scene.");
    println!("Use ←/→ to step through scenes, 1-9 to jump, space to toggle auto-rotate.");
    let layers = viewer.tour().layers();
    for (index, layer) in layers.iter().take(12).enumerate() {
        println!("  F{:<2} toggles path layer {layer}", index + 1);
    }
    println!();
}
