// SPDX-License-Identifier: GPL-3.0-only

//! Snapshot of a camera frame
//!
//! A snapshot mirrors the frame horizontally (so the stored photo matches the
//! mirrored live preview the user saw) and encodes it as PNG.

use super::encoding::PhotoEncoder;
use crate::backends::camera::types::CameraFrame;
use crate::errors::PhotoError;
use image::RgbaImage;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// One photo of a session
///
/// Immutable once created; cloning shares the underlying buffers.
#[derive(Clone)]
pub struct CapturedImage {
    pixels: Arc<RgbaImage>,
    encoded: Arc<[u8]>,
}

impl CapturedImage {
    /// Wrap already-oriented pixels, encoding them as PNG
    pub fn from_pixels(pixels: RgbaImage) -> Result<Self, PhotoError> {
        let encoded = PhotoEncoder::encode_png(&pixels).map_err(PhotoError::EncodingFailed)?;
        Ok(Self {
            pixels: Arc::new(pixels),
            encoded: Arc::from(encoded),
        })
    }

    /// Decoded pixels, used by the frame renderer
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// PNG encoding of the photo
    pub fn encoded_png(&self) -> &[u8] {
        &self.encoded
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

impl PartialEq for CapturedImage {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.encoded, &other.encoded) || self.encoded == other.encoded
    }
}

impl Eq for CapturedImage {}

impl fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CapturedImage({}x{}, {} bytes)",
            self.width(),
            self.height(),
            self.encoded.len()
        )
    }
}

/// Photo capture handler
pub struct PhotoCapture;

impl PhotoCapture {
    /// Turn a live frame into a captured photo
    ///
    /// # Arguments
    /// * `frame` - Latest frame from the camera source
    /// * `mirror` - Flip horizontally to match a mirrored preview
    pub fn from_frame(frame: &CameraFrame, mirror: bool) -> Result<CapturedImage, PhotoError> {
        let mut image = frame.to_image().ok_or(PhotoError::SnapshotNotReady)?;

        if mirror {
            image::imageops::flip_horizontal_in_place(&mut image);
        }

        let captured = CapturedImage::from_pixels(image)?;
        debug!(
            width = frame.width,
            height = frame.height,
            mirror,
            bytes = captured.encoded_png().len(),
            "Frame captured"
        );
        Ok(captured)
    }
}
