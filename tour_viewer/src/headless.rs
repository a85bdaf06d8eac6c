//! `--headless`: run the scene manager without a window until the current
//! scene settles, then print what a frame would contain.

use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use tour_core::{FrameStats, OrbitControls, ThreadedImageLoader, ViewerState, Viewport};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn run(
    viewer: &mut ViewerState,
    loader: &mut ThreadedImageLoader,
    controls: &mut OrbitControls,
    viewport: Viewport,
    timeout: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    controls.set_viewport_height(viewport.height);

    let mut stats = viewer.tick(loader, controls, 0.0, viewport);
    while stats.loading {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            bail!(
                "panorama for scene '{}' still loading after {} ms",
                viewer.current_scene().id,
                timeout.as_millis()
            );
        }
        for result in loader.wait(remaining.min(POLL_INTERVAL)) {
            viewer.apply_load_result(result);
        }
        stats = viewer.tick(loader, controls, 0.0, viewport);
    }

    print_frame_summary(viewer, &stats);
    Ok(())
}

fn print_frame_summary(viewer: &ViewerState, stats: &FrameStats) {
    let scene = viewer.current_scene();
    println!(
        "Scene {}/{}: {} ({})",
        stats.scene_index + 1,
        viewer.tour().len(),
        scene.id,
        scene.name
    );

    match viewer.graph().panorama() {
        Some((_, panorama)) => println!(
            "  panorama: {}x{} from {}",
            panorama.image.width,
            panorama.image.height,
            panorama.image.source.display()
        ),
        None => match viewer.last_error() {
            Some(err) => println!("  panorama: unavailable ({})", err.reason),
            None => println!("  panorama: unavailable"),
        },
    }

    let visible_segments = viewer.graph().visible_segments().count();
    println!(
        "  path segments: {} attached, {} visible",
        stats.segment_count, visible_segments
    );
    println!(
        "  hotspot markers: {} attached, {} on screen",
        stats.marker_count, stats.visible_markers
    );
    for (_, marker) in viewer.graph().markers() {
        let Some(screen) = marker.visible_screen() else {
            continue;
        };
        let label = marker
            .label
            .as_deref()
            .map(|label| format!(" \"{label}\""))
            .unwrap_or_default();
        println!(
            "    -> {}{} at ({:.1}, {:.1})",
            marker.target_id, label, screen.x, screen.y
        );
    }
}
