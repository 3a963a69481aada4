// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera backends

use crate::errors::ParseError;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

/// A single RGBA frame delivered by a camera source
#[derive(Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA pixels (4 bytes per pixel, no row padding)
    pub data: Arc<[u8]>,
    /// Timestamp when frame was captured
    pub captured_at: Instant,
}

impl CameraFrame {
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data),
            captured_at: Instant::now(),
        }
    }

    pub fn from_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self::from_rgba(width, height, image.into_raw())
    }

    /// Check that the buffer holds exactly width * height pixels
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.data.len() == (self.width * self.height * 4) as usize
    }

    /// Copy the pixels into an owned image buffer
    pub fn to_image(&self) -> Option<RgbaImage> {
        if !self.is_valid() {
            return None;
        }
        RgbaImage::from_raw(self.width, self.height, self.data.to_vec())
    }

    /// RGB of the pixel at (x, y), clamped to the frame bounds
    pub fn pixel_rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if !self.is_valid() {
            return (0, 0, 0);
        }
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let idx = ((y * self.width + x) * 4) as usize;
        (self.data[idx], self.data[idx + 1], self.data[idx + 2])
    }
}

impl fmt::Debug for CameraFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Raw pixel formats a device may be configured for, in order of preference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Packed YUV 4:2:2
    Yuyv,
    /// Motion JPEG
    Mjpeg,
    /// Packed 24-bit RGB
    Rgb24,
}

impl PixelFormat {
    pub const PREFERRED: [PixelFormat; 3] = [PixelFormat::Yuyv, PixelFormat::Mjpeg, PixelFormat::Rgb24];

    pub fn fourcc(self) -> &'static [u8; 4] {
        match self {
            PixelFormat::Yuyv => b"YUYV",
            PixelFormat::Mjpeg => b"MJPG",
            PixelFormat::Rgb24 => b"RGB3",
        }
    }

    pub fn from_fourcc(repr: &[u8; 4]) -> Option<Self> {
        Self::PREFERRED.into_iter().find(|f| f.fourcc() == repr)
    }
}

/// A video device found during enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// Human-readable name (V4L2 card)
    pub name: String,
    /// Device path (e.g., /dev/video0)
    pub path: PathBuf,
    /// Driver name (V4L2 driver)
    pub driver: String,
}

impl fmt::Display for CameraDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.path.display())
    }
}

/// Which camera source to open
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CameraSpec {
    /// First V4L2 device, test pattern when none exists
    #[default]
    Auto,
    /// A specific V4L2 device node
    Device(PathBuf),
    /// Cycle through the images in a directory
    Still(PathBuf),
    /// Synthetic moving test pattern
    Pattern,
}

impl FromStr for CameraSpec {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseError::CameraSpec("empty camera spec".to_string()));
        }
        if s.eq_ignore_ascii_case("auto") {
            return Ok(CameraSpec::Auto);
        }
        if s.eq_ignore_ascii_case("pattern") {
            return Ok(CameraSpec::Pattern);
        }
        if let Some(dir) = s.strip_prefix("still:") {
            if dir.is_empty() {
                return Err(ParseError::CameraSpec("still: needs a directory".to_string()));
            }
            return Ok(CameraSpec::Still(PathBuf::from(dir)));
        }
        Ok(CameraSpec::Device(PathBuf::from(s.strip_prefix("v4l2:").unwrap_or(s))))
    }
}

impl fmt::Display for CameraSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraSpec::Auto => write!(f, "auto"),
            CameraSpec::Device(path) => write!(f, "{}", path.display()),
            CameraSpec::Still(dir) => write!(f, "still:{}", dir.display()),
            CameraSpec::Pattern => write!(f, "pattern"),
        }
    }
}

impl TryFrom<String> for CameraSpec {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CameraSpec> for String {
    fn from(spec: CameraSpec) -> Self {
        spec.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_spec_parse() {
        assert_eq!("auto".parse::<CameraSpec>().unwrap(), CameraSpec::Auto);
        assert_eq!("pattern".parse::<CameraSpec>().unwrap(), CameraSpec::Pattern);
        assert_eq!(
            "still:/tmp/shots".parse::<CameraSpec>().unwrap(),
            CameraSpec::Still(PathBuf::from("/tmp/shots"))
        );
        assert_eq!(
            "v4l2:/dev/video2".parse::<CameraSpec>().unwrap(),
            CameraSpec::Device(PathBuf::from("/dev/video2"))
        );
        assert!(matches!(
            "still:".parse::<CameraSpec>(),
            Err(ParseError::CameraSpec(_))
        ));
    }

    #[test]
    fn test_frame_validation() {
        let frame = CameraFrame::from_rgba(2, 2, vec![0u8; 16]);
        assert!(frame.is_valid());
        assert!(frame.to_image().is_some());

        let short = CameraFrame::from_rgba(2, 2, vec![0u8; 15]);
        assert!(!short.is_valid());
        assert!(short.to_image().is_none());
        assert_eq!(short.pixel_rgb(0, 0), (0, 0, 0));
    }

    #[test]
    fn test_pixel_format_fourcc() {
        assert_eq!(PixelFormat::from_fourcc(b"YUYV"), Some(PixelFormat::Yuyv));
        assert_eq!(PixelFormat::from_fourcc(b"MJPG"), Some(PixelFormat::Mjpeg));
        assert_eq!(PixelFormat::from_fourcc(b"Y10B"), None);
    }

    #[test]
    fn test_pixel_rgb_clamps() {
        let mut data = vec![0u8; 16];
        data[12..16].copy_from_slice(&[9, 8, 7, 255]);
        let frame = CameraFrame::from_rgba(2, 2, data);
        assert_eq!(frame.pixel_rgb(10, 10), (9, 8, 7));
    }
}
