// SPDX-License-Identifier: GPL-3.0-only

//! Camera sources that need no hardware
//!
//! A directory of stills (each photo advances to the next image) and a
//! synthetic moving test pattern. Both behave like a real stream: nothing is
//! available before `acquire`, an optional warm-up delays readiness, and
//! `release` empties the feed.

use super::CameraSource;
use super::types::CameraFrame;
use crate::constants::file_formats;
use crate::errors::CameraError;
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

enum Feed {
    Directory { dir: PathBuf, frames: Vec<CameraFrame>, cursor: usize },
    Pattern { width: u32, height: u32, tick: u32 },
}

/// Still-image or test-pattern camera
pub struct StillCamera {
    feed: Feed,
    streaming: bool,
    /// Frame requests still to be answered with "not ready"
    warmup: u32,
    warmup_polls: u32,
}

impl StillCamera {
    /// Cycle through the images found in `dir`
    pub fn from_dir(dir: PathBuf) -> Self {
        Self::with_feed(Feed::Directory {
            dir,
            frames: Vec::new(),
            cursor: 0,
        })
    }

    /// Animated colour-bar pattern of the given size
    pub fn pattern(width: u32, height: u32) -> Self {
        Self::with_feed(Feed::Pattern {
            width: width.max(1),
            height: height.max(1),
            tick: 0,
        })
    }

    fn with_feed(feed: Feed) -> Self {
        Self {
            feed,
            streaming: false,
            warmup: 0,
            warmup_polls: 0,
        }
    }

    /// Withhold the first `polls` frame requests after each acquire
    pub fn with_warmup(mut self, polls: u32) -> Self {
        self.warmup = polls;
        self
    }

    fn current(&self) -> Option<CameraFrame> {
        match &self.feed {
            Feed::Directory { frames, cursor, .. } => frames.get(*cursor).cloned(),
            Feed::Pattern { width, height, tick } => {
                Some(CameraFrame::from_image(test_pattern(*width, *height, *tick)))
            }
        }
    }

    fn warming_up(&mut self) -> bool {
        if self.warmup_polls > 0 {
            self.warmup_polls -= 1;
            return true;
        }
        false
    }
}

impl CameraSource for StillCamera {
    fn name(&self) -> String {
        match &self.feed {
            Feed::Directory { dir, .. } => format!("still:{}", dir.display()),
            Feed::Pattern { .. } => "test pattern".to_string(),
        }
    }

    fn acquire(&mut self) -> Result<(), CameraError> {
        if let Feed::Directory { dir, frames, cursor } = &mut self.feed {
            *frames = load_stills(dir)?;
            *cursor = 0;
            info!(dir = %dir.display(), count = frames.len(), "Loaded still images");
        }
        self.streaming = true;
        self.warmup_polls = self.warmup;
        Ok(())
    }

    fn latest_frame(&mut self) -> Option<CameraFrame> {
        if !self.streaming || self.warming_up() {
            return None;
        }
        if let Feed::Pattern { tick, .. } = &mut self.feed {
            *tick = tick.wrapping_add(1);
        }
        self.current()
    }

    fn capture_frame(&mut self) -> Option<CameraFrame> {
        if !self.streaming || self.warmup_polls > 0 {
            return None;
        }
        let frame = self.current();
        if let Feed::Directory { frames, cursor, .. } = &mut self.feed {
            if !frames.is_empty() {
                *cursor = (*cursor + 1) % frames.len();
            }
        }
        frame
    }

    fn release(&mut self) {
        self.streaming = false;
        if let Feed::Directory { frames, .. } = &mut self.feed {
            frames.clear();
        }
    }
}

/// Load every decodable image in `dir`, sorted by file name
fn load_stills(dir: &Path) -> Result<Vec<CameraFrame>, CameraError> {
    let context = dir.display().to_string();
    let entries = std::fs::read_dir(dir).map_err(|e| CameraError::from_io(&context, &e))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(file_formats::is_image_extension)
        })
        .collect();
    paths.sort();

    let mut frames = Vec::with_capacity(paths.len());
    for path in paths {
        match image::open(&path) {
            Ok(img) => frames.push(CameraFrame::from_image(img.to_rgba8())),
            Err(e) => debug!(path = %path.display(), error = %e, "Skipping unreadable image"),
        }
    }

    if frames.is_empty() {
        return Err(CameraError::DeviceNotFound(format!(
            "{}: no images found",
            context
        )));
    }
    Ok(frames)
}

/// Vertical colour bars with a band sweeping across them
fn test_pattern(width: u32, height: u32, tick: u32) -> RgbaImage {
    const BARS: [[u8; 3]; 7] = [
        [192, 192, 192],
        [192, 192, 0],
        [0, 192, 192],
        [0, 192, 0],
        [192, 0, 192],
        [192, 0, 0],
        [0, 0, 192],
    ];
    let band = (tick.wrapping_mul(4)) % height;
    let band_height = (height / 12).max(1);

    RgbaImage::from_fn(width, height, |x, y| {
        if y >= band && y < band + band_height {
            return Rgba([235, 235, 235, 255]);
        }
        let bar = BARS[(x * BARS.len() as u32 / width) as usize];
        Rgba([bar[0], bar[1], bar[2], 255])
    })
}
