use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use tempfile::tempdir;

fn write_tour(dir: &Path) -> Result<()> {
    RgbaImage::from_pixel(32, 16, Rgba([90, 120, 150, 255]))
        .save(dir.join("atrium.png"))
        .context("writing atrium panorama")?;
    let manifest = r##"{
        "scenes": [
            {
                "id": "atrium",
                "name": "Atrium",
                "image": "atrium.png",
                "paths": [
                    { "type": "EL", "color": "#ff8800", "points": [[0,-2,-5],[0,8,-5],[4,8,-5]] },
                    { "type": "WP", "points": [[-3,-2,-5],[3,-2,-5]] }
                ],
                "hotspots": [ { "position": [0, 0, -10], "targetId": "garden", "label": "Garden door" } ]
            },
            { "id": "garden", "name": "Garden", "image": "garden.png" }
        ]
    }"##;
    fs::write(dir.join("tour.json"), manifest).context("writing manifest")?;
    Ok(())
}

fn run_viewer(dir: &Path, extra: &[&str]) -> Result<Output> {
    let manifest = dir.join("tour.json");
    let manifest_str = manifest
        .to_str()
        .context("manifest path is not valid UTF-8")?;
    Command::new(env!("CARGO_BIN_EXE_tour_viewer"))
        .args([
            "--manifest",
            manifest_str,
            "--headless",
            "--width",
            "800",
            "--height",
            "600",
        ])
        .args(extra)
        .output()
        .context("executing tour_viewer")
}

fn transcript(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).to_string();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}

#[test]
fn headless_run_reports_the_first_scene() -> Result<()> {
    let dir = tempdir().context("creating temporary tour directory")?;
    write_tour(dir.path())?;

    let output = run_viewer(dir.path(), &["--hide-layer", "WP"])?;
    let text = transcript(&output);
    assert!(
        output.status.success(),
        "tour_viewer exited with {:?}: {text}",
        output.status
    );

    let overview = format!("Tour: 2 scenes from {}", dir.path().display());
    assert!(text.contains(&overview), "{text}");
    assert!(text.contains("Scene 1/2: atrium (Atrium)"), "{text}");
    assert!(text.contains("panorama: 32x16"), "{text}");
    assert!(
        text.contains("path segments: 3 attached, 2 visible"),
        "{text}"
    );
    assert!(
        text.contains("hotspot markers: 1 attached, 1 on screen"),
        "{text}"
    );
    assert!(text.contains("-> garden \"Garden door\" at ("), "{text}");
    Ok(())
}

#[test]
fn start_scene_without_an_image_still_succeeds() -> Result<()> {
    let dir = tempdir().context("creating temporary tour directory")?;
    write_tour(dir.path())?;

    let output = run_viewer(dir.path(), &["--start-scene", "garden"])?;
    let text = transcript(&output);
    assert!(output.status.success(), "{text}");
    assert!(text.contains("Scene 2/2: garden (Garden)"), "{text}");
    assert!(text.contains("panorama: unavailable ("), "{text}");
    assert!(text.contains("hotspot markers: 0 attached"), "{text}");
    Ok(())
}

#[test]
fn unknown_start_scene_falls_back_to_the_first_scene() -> Result<()> {
    let dir = tempdir().context("creating temporary tour directory")?;
    write_tour(dir.path())?;

    let output = Command::new(env!("CARGO_BIN_EXE_tour_viewer"))
        .env("RUST_LOG", "warn")
        .args(["--headless", "--start-scene", "basement", "--manifest"])
        .arg(dir.path().join("tour.json"))
        .output()
        .context("executing tour_viewer")?;
    let text = transcript(&output);
    assert!(output.status.success(), "{text}");
    assert!(text.contains("--start-scene basement"), "{text}");
    assert!(text.contains("Scene 1/2: atrium (Atrium)"), "{text}");
    assert!(text.contains("panorama: 32x16"), "{text}");
    Ok(())
}

#[test]
fn truncated_manifest_fails() -> Result<()> {
    let dir = tempdir().context("creating temporary tour directory")?;
    write_tour(dir.path())?;

    fs::write(dir.path().join("tour.json"), "{ \"scenes\": [ { \"id\": ")
        .context("truncating manifest")?;
    let output = run_viewer(dir.path(), &[])?;
    assert!(!output.status.success());
    assert!(transcript(&output).contains("tour.json"));
    Ok(())
}
