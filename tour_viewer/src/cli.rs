use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tour_core::{ViewerConfig, load_viewer_preset};

#[derive(Parser, Debug)]
#[command(about = "Walk through a 360° panorama tour", version)]
pub struct Args {
    /// Tour manifest JSON listing scenes, paths, and hotspots
    #[arg(long, default_value = "tour.json")]
    pub manifest: PathBuf,

    /// Optional viewer preset JSON overriding sphere, camera, and control settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Scene id to open instead of the first scene in the manifest
    #[arg(long)]
    pub start_scene: Option<String>,

    /// Hide a path layer (EL, WP, AC, ...) at startup; may be repeated
    #[arg(long = "hide-layer", value_name = "LAYER")]
    pub hidden_layers: Vec<String>,

    /// Start with auto-rotate switched off
    #[arg(long)]
    pub no_auto_rotate: bool,

    /// Skip creating a winit window/event loop; load the first scene and print a summary
    #[arg(long)]
    pub headless: bool,

    /// How long headless mode waits for the panorama before giving up
    #[arg(long, default_value_t = 10_000)]
    pub headless_timeout_ms: u64,

    /// Initial window width (also the headless viewport width)
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Initial window height (also the headless viewport height)
    #[arg(long, default_value_t = 720)]
    pub height: u32,
}

impl Args {
    /// Defaults, then the preset file, then command-line switches.
    pub fn viewer_config(&self) -> Result<ViewerConfig> {
        let mut config = match self.config.as_ref() {
            Some(path) => {
                let preset = load_viewer_preset(path)?;
                ViewerConfig::from_preset(&preset)
                    .with_context(|| format!("applying viewer preset {}", path.display()))?
            }
            None => ViewerConfig::default(),
        };
        if self.no_auto_rotate {
            config.controls.auto_rotate = false;
        }
        config.validate().context("validating viewer configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod args_tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn hide_layer_is_repeatable() {
        let args = Args::parse_from([
            "tour_viewer",
            "--manifest",
            "site/tour.json",
            "--hide-layer",
            "EL",
            "--hide-layer",
            "AC",
            "--no-auto-rotate",
        ]);
        assert_eq!(args.manifest, PathBuf::from("site/tour.json"));
        assert_eq!(args.hidden_layers, vec!["EL".to_string(), "AC".to_string()]);
        assert!(!args.viewer_config().expect("config").controls.auto_rotate);
    }

    #[test]
    fn preset_overrides_defaults() {
        let dir = tempdir().expect("temp dir");
        let preset = dir.path().join("viewer.json");
        fs::write(&preset, r#"{ "sphere_radius": 80.0, "camera": { "fov_degrees": 60.0 } }"#)
            .expect("write preset");
        let args = Args::parse_from([
            "tour_viewer",
            "--config",
            preset.to_str().expect("utf-8 path"),
        ]);
        let config = args.viewer_config().expect("config");
        assert_eq!(config.sphere_radius, 80.0);
        assert_eq!(config.camera.fov_degrees, 60.0);
        assert!(config.controls.auto_rotate);
    }

    #[test]
    fn missing_preset_is_reported_with_its_path() {
        let args = Args::parse_from(["tour_viewer", "--config", "/nonexistent/viewer.json"]);
        let err = args.viewer_config().expect_err("missing preset");
        assert!(format!("{err:#}").contains("/nonexistent/viewer.json"));
    }
}
