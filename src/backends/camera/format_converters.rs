// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion for raw V4L2 buffers
//!
//! Every camera source hands out tightly packed RGBA, so the raw formats a
//! webcam may deliver are converted here.

use super::types::{CameraFrame, PixelFormat};
use tracing::debug;

/// Convert a raw buffer in `format` to an RGBA frame
///
/// Returns `None` for buffers that do not hold a complete frame.
pub fn to_frame(format: PixelFormat, buf: &[u8], width: u32, height: u32) -> Option<CameraFrame> {
    let frame = match format {
        PixelFormat::Yuyv => CameraFrame::from_rgba(width, height, yuyv_to_rgba(buf, width, height)),
        PixelFormat::Rgb24 => CameraFrame::from_rgba(width, height, rgb_to_rgba(buf)),
        PixelFormat::Mjpeg => match mjpeg_to_rgba(buf) {
            Ok((rgba, w, h)) => CameraFrame::from_rgba(w, h, rgba),
            Err(e) => {
                debug!(error = %e, "Dropping undecodable MJPEG frame");
                return None;
            }
        },
    };
    frame.is_valid().then_some(frame)
}

/// Convert YUYV (YUV 4:2:2) to RGBA
///
/// YUYV format: Y0 U0 Y1 V0 - each 4-byte group encodes 2 pixels.
/// Uses BT.601 coefficients for YUV to RGB conversion.
pub fn yuyv_to_rgba(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut rgba = Vec::with_capacity(pixel_count * 4);

    for chunk in data.chunks_exact(4) {
        let y0 = chunk[0] as f32;
        let u = chunk[1] as f32 - 128.0;
        let y1 = chunk[2] as f32;
        let v = chunk[3] as f32 - 128.0;

        for y in [y0, y1] {
            let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
            let g = (y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
            let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

            rgba.extend_from_slice(&[r, g, b, 255]);
        }

        if rgba.len() >= pixel_count * 4 {
            break;
        }
    }

    rgba.truncate(pixel_count * 4);
    rgba
}

/// Convert packed RGB24 to RGBA (alpha = 255)
pub fn rgb_to_rgba(rgb: &[u8]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(rgb.len() / 3 * 4);
    for px in rgb.chunks_exact(3) {
        rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
    }
    rgba
}

/// Decode an MJPEG buffer to RGBA, returning (pixels, width, height)
pub fn mjpeg_to_rgba(data: &[u8]) -> Result<(Vec<u8>, u32, u32), String> {
    let image = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
        .map_err(|e| format!("MJPEG decode failed: {}", e))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok((image.into_raw(), width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuyv_to_rgba_white() {
        // Pure white in YUV (Y=255, U=128, V=128)
        let yuyv = vec![255u8, 128, 255, 128];
        let rgba = yuyv_to_rgba(&yuyv, 2, 1);

        assert_eq!(rgba.len(), 8);
        assert!(rgba[0] > 250); // R
        assert!(rgba[1] > 250); // G
        assert!(rgba[2] > 250); // B
        assert_eq!(rgba[3], 255); // A
    }

    #[test]
    fn test_yuyv_short_buffer_is_not_padded() {
        let rgba = yuyv_to_rgba(&[16, 128, 16, 128], 4, 1);
        assert_eq!(rgba.len(), 8);
    }

    #[test]
    fn test_rgb_to_rgba() {
        let rgb = vec![255, 128, 64, 0, 0, 0];
        let rgba = rgb_to_rgba(&rgb);

        assert_eq!(rgba.len(), 8);
        assert_eq!(rgba[0..4], [255, 128, 64, 255]);
        assert_eq!(rgba[4..8], [0, 0, 0, 255]);
    }

    #[test]
    fn test_short_yuyv_frame_is_dropped() {
        assert!(to_frame(PixelFormat::Yuyv, &[0, 128, 0, 128], 4, 4).is_none());
        assert!(to_frame(PixelFormat::Rgb24, &[1, 2, 3, 4, 5, 6], 2, 1).is_some());
    }

    #[test]
    fn test_mjpeg_rejects_garbage() {
        assert!(mjpeg_to_rgba(&[0, 1, 2, 3]).is_err());
    }
}
