//! Panorama image fetching. Requests are tagged with the `LoadToken` minted by
//! the scene manager; the loader never inspects tokens, it only hands them back
//! with the decoded image (or the failure) so stale results can be discarded.

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        mpsc::{self, Receiver, RecvTimeoutError, SendError, Sender},
    },
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, ensure};
use image::imageops::FilterType;

use crate::error::ImageLoadError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadToken(u64);

impl LoadToken {
    pub fn raw(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        LoadToken(self.0 + 1)
    }
}

/// Decoded RGBA8 pixels, row-major from the top-left corner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanoramaImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    pub source: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub token: LoadToken,
    pub scene_index: usize,
    pub scene_id: String,
    pub path: PathBuf,
}

impl ImageRequest {
    pub fn fail(&self, reason: impl Into<String>) -> ImageLoadResult {
        ImageLoadResult {
            token: self.token,
            scene_index: self.scene_index,
            outcome: Err(ImageLoadError {
                scene_id: self.scene_id.clone(),
                path: self.path.clone(),
                reason: reason.into(),
            }),
        }
    }

    pub fn succeed(&self, image: PanoramaImage) -> ImageLoadResult {
        ImageLoadResult {
            token: self.token,
            scene_index: self.scene_index,
            outcome: Ok(Arc::new(image)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageLoadResult {
    pub token: LoadToken,
    pub scene_index: usize,
    pub outcome: Result<Arc<PanoramaImage>, ImageLoadError>,
}

/// Asynchronous image source. `request` must not block; completions are
/// collected with `drain` from the frame loop.
pub trait ImageLoader {
    fn request(&mut self, request: ImageRequest);
    fn drain(&mut self) -> Vec<ImageLoadResult>;
}

/// Failure reason for requests dropped because a newer request was queued
/// behind them before the worker got to them.
pub const SUPERSEDED_REASON: &str = "superseded by a newer request";

enum LoaderCommand {
    Load(ImageRequest),
    Shutdown,
}

/// Decodes on one long-lived worker thread and posts results back over a
/// channel. Requests that pile up while a decode runs are collapsed: only the
/// newest is decoded and the older ones are answered with `SUPERSEDED_REASON`,
/// which the scene manager discards as stale anyway.
pub struct ThreadedImageLoader {
    commands: Sender<LoaderCommand>,
    results_tx: Sender<ImageLoadResult>,
    results: Receiver<ImageLoadResult>,
    join: Option<thread::JoinHandle<()>>,
    in_flight: usize,
}

impl ThreadedImageLoader {
    pub fn new(max_texture_side: u32) -> Result<Self> {
        let (command_tx, command_rx) = mpsc::channel();
        let (result_tx, result_rx) = mpsc::channel();
        let worker_results = result_tx.clone();
        let max_side = max_texture_side.max(1);
        let join = thread::Builder::new()
            .name("tour_image_loader".to_string())
            .spawn(move || run_worker(command_rx, worker_results, max_side))
            .context("failed to spawn image loader thread")?;
        Ok(Self {
            commands: command_tx,
            results_tx: result_tx,
            results: result_rx,
            join: Some(join),
            in_flight: 0,
        })
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Blocks until at least one result arrives or `timeout` passes, then
    /// returns everything available. Used by headless runs.
    pub fn wait(&mut self, timeout: Duration) -> Vec<ImageLoadResult> {
        let deadline = Instant::now() + timeout;
        let mut results = Vec::new();
        if self.in_flight == 0 {
            return results;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        match self.results.recv_timeout(remaining) {
            Ok(result) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                results.push(result);
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return results,
        }
        results.extend(self.drain());
        results
    }
}

impl ImageLoader for ThreadedImageLoader {
    fn request(&mut self, request: ImageRequest) {
        self.in_flight += 1;
        if let Err(SendError(LoaderCommand::Load(request))) =
            self.commands.send(LoaderCommand::Load(request))
        {
            log::warn!(
                "image loader worker has stopped; failing load token {}",
                request.token.raw()
            );
            let _ = self
                .results_tx
                .send(request.fail("image loader worker has stopped"));
        }
    }

    fn drain(&mut self) -> Vec<ImageLoadResult> {
        let results: Vec<ImageLoadResult> = self.results.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(results.len());
        results
    }
}

impl Drop for ThreadedImageLoader {
    fn drop(&mut self) {
        let _ = self.commands.send(LoaderCommand::Shutdown);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// The newest queued request plus everything it overtook, oldest first.
struct RequestBatch {
    newest: ImageRequest,
    superseded: Vec<ImageRequest>,
}

/// Blocks for the next request, then folds in everything already queued
/// behind it. `None` on shutdown or when the loader is gone.
fn next_batch(commands: &Receiver<LoaderCommand>) -> Option<RequestBatch> {
    let mut newest = match commands.recv().ok()? {
        LoaderCommand::Load(request) => request,
        LoaderCommand::Shutdown => return None,
    };
    let mut superseded = Vec::new();
    for command in commands.try_iter() {
        match command {
            LoaderCommand::Load(request) => {
                superseded.push(std::mem::replace(&mut newest, request));
            }
            LoaderCommand::Shutdown => return None,
        }
    }
    Some(RequestBatch { newest, superseded })
}

fn run_worker(commands: Receiver<LoaderCommand>, results: Sender<ImageLoadResult>, max_side: u32) {
    while let Some(batch) = next_batch(&commands) {
        for request in batch.superseded {
            log::debug!(
                "skipping decode of {} (load token {} superseded)",
                request.path.display(),
                request.token.raw()
            );
            if results.send(request.fail(SUPERSEDED_REASON)).is_err() {
                return;
            }
        }
        let request = batch.newest;
        let result = match decode_panorama(&request.path, max_side) {
            Ok(image) => request.succeed(image),
            Err(err) => request.fail(format!("{err:#}")),
        };
        if results.send(result).is_err() {
            return;
        }
    }
}

/// Read and decode an image file into RGBA8, shrinking it (aspect preserved)
/// so neither side exceeds `max_side`.
pub fn decode_panorama(path: &Path, max_side: u32) -> Result<PanoramaImage> {
    let reader = image::io::Reader::open(path)
        .with_context(|| format!("opening {}", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("sniffing image format of {}", path.display()))?;
    let mut decoded = reader
        .decode()
        .with_context(|| format!("decoding {}", path.display()))?;

    let max_side = max_side.max(1);
    if decoded.width() > max_side || decoded.height() > max_side {
        log::info!(
            "downscaling {} from {}x{} to fit {max_side}px",
            path.display(),
            decoded.width(),
            decoded.height()
        );
        decoded = decoded.resize(max_side, max_side, FilterType::Triangle);
    }

    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    ensure!(
        width > 0 && height > 0,
        "{} decoded to an empty image",
        path.display()
    );
    Ok(PanoramaImage {
        width,
        height,
        rgba: rgba.into_raw(),
        source: path.to_path_buf(),
    })
}

#[cfg(test)]
mod decode_tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let image = RgbaImage::from_fn(width, height, |x, _| Rgba([(x % 256) as u8, 0, 0, 255]));
        image.save(&path).expect("write png fixture");
        path
    }

    #[test]
    fn decodes_png_to_rgba() {
        let dir = tempdir().expect("temp dir");
        let path = write_png(dir.path(), "pano.png", 8, 4);
        let image = decode_panorama(&path, 8192).expect("decode");
        assert_eq!((image.width, image.height), (8, 4));
        assert_eq!(image.rgba.len(), 8 * 4 * 4);
        assert_eq!(&image.rgba[4..8], &[1, 0, 0, 255]);
        assert_eq!(image.source, path);
    }

    #[test]
    fn oversized_images_are_downscaled_preserving_aspect() {
        let dir = tempdir().expect("temp dir");
        let path = write_png(dir.path(), "wide.png", 64, 32);
        let image = decode_panorama(&path, 16).expect("decode");
        assert_eq!((image.width, image.height), (16, 8));
    }

    #[test]
    fn missing_and_corrupt_files_fail_with_context() {
        let dir = tempdir().expect("temp dir");
        let missing = dir.path().join("nope.jpg");
        let err = decode_panorama(&missing, 64).expect_err("missing file");
        assert!(format!("{err:#}").contains("opening"));

        let corrupt = dir.path().join("corrupt.png");
        std::fs::write(&corrupt, b"definitely not a png").expect("write corrupt file");
        let err = decode_panorama(&corrupt, 64).expect_err("corrupt file");
        assert!(format!("{err:#}").contains("corrupt.png"));
    }
}
