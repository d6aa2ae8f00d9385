use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{ImageReader, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::models::Resolution;

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "ppm"];

/// A camera-like producer of fixed-resolution frames.
///
/// `Err` is a failed read of one frame; the caller may try again next tick.
/// `Ok(None)` means the device is closed and no more frames will come.
pub trait FrameSource {
    fn resolution(&self) -> Resolution;

    fn read_frame(&mut self) -> Result<Option<RgbImage>>;
}

/// Replays a directory of recorded frames in file-name order
#[derive(Debug)]
pub struct ImageDirectorySource {
    frames: std::vec::IntoIter<PathBuf>,
    resolution: Resolution,
}

impl ImageDirectorySource {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to open frame directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            })
            .collect();
        paths.sort();

        let first = paths
            .first()
            .ok_or_else(|| anyhow::anyhow!("No frames found in {}", dir.display()))?;
        let (width, height) = image::image_dimensions(first)
            .with_context(|| format!("Failed to read frame header {}", first.display()))?;

        info!(frames = paths.len(), width, height, dir = %dir.display(), "Opened frame directory");

        Ok(Self {
            frames: paths.into_iter(),
            resolution: Resolution::new(width, height),
        })
    }
}

impl FrameSource for ImageDirectorySource {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        let Some(path) = self.frames.next() else {
            return Ok(None);
        };
        let frame = ImageReader::open(&path)?
            .decode()
            .map_err(|e| anyhow::anyhow!("Failed to decode frame {}: {}", path.display(), e))?
            .to_rgb8();

        let Resolution { width, height } = self.resolution;
        if frame.dimensions() != (width, height) {
            debug!(path = %path.display(), "Resizing frame to nominal resolution");
            return Ok(Some(imageops::resize(&frame, width, height, FilterType::Triangle)));
        }
        Ok(Some(frame))
    }
}

type FrameSlot = Option<Arc<RgbImage>>;

/// Reads frames on a background thread into a single-slot handoff
pub struct CaptureThread {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CaptureThread {
    pub fn spawn(mut source: Box<dyn FrameSource + Send>) -> (Self, LatestFrame) {
        let resolution = source.resolution();
        let (sender, receiver) = watch::channel::<FrameSlot>(None);
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();

        let handle = std::thread::spawn(move || {
            while !stop_flag.load(Ordering::Relaxed) {
                match source.read_frame() {
                    Ok(Some(frame)) => {
                        // An unconsumed frame is overwritten, never queued
                        if sender.send(Some(Arc::new(frame))).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => warn!("Capture thread failed to read frame: {:#}", e),
                }
            }
            debug!("Capture thread stopped");
        });

        (
            Self {
                stop,
                handle: Some(handle),
            },
            LatestFrame {
                receiver,
                resolution,
            },
        )
    }
}

impl Drop for CaptureThread {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Consumer side of the capture slot; always yields the newest frame
pub struct LatestFrame {
    receiver: watch::Receiver<FrameSlot>,
    resolution: Resolution,
}

impl LatestFrame {
    fn take_new(&mut self) -> Option<RgbImage> {
        let slot = self.receiver.borrow_and_update();
        if !slot.has_changed() {
            return None;
        }
        slot.as_ref().map(|frame| RgbImage::clone(frame))
    }
}

impl FrameSource for LatestFrame {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Block until a frame newer than the last one read arrives
    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        loop {
            if let Some(frame) = self.take_new() {
                return Ok(Some(frame));
            }
            if self.receiver.has_changed().is_err() {
                // Producer gone; drain a frame sent just before it closed
                return Ok(self.take_new());
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}
