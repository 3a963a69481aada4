// SPDX-License-Identifier: GPL-3.0-only

//! PNG encoding and saving of photobooth artifacts

use crate::constants::export;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Encoded image data ready for saving
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Photo encoder (PNG only; artifacts are lossless)
pub struct PhotoEncoder;

impl PhotoEncoder {
    /// Encode an RGBA image as PNG
    pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, String> {
        let mut buffer = Vec::new();

        image
            .write_to(
                &mut std::io::Cursor::new(&mut buffer),
                image::ImageFormat::Png,
            )
            .map_err(|e| format!("PNG encoding failed: {}", e))?;

        Ok(buffer)
    }

    /// Encode a rendered frame for export
    pub fn encode(image: &RgbaImage) -> Result<EncodedImage, String> {
        let data = Self::encode_png(image)?;
        debug!(size = data.len(), "Encoding complete");
        Ok(EncodedImage {
            data,
            width: image.width(),
            height: image.height(),
        })
    }

    /// Write encoded data to `output_dir/filename` without leaving partial files
    ///
    /// The data goes to a hidden temporary file first and is renamed into place,
    /// so a failed write never produces a truncated artifact.
    pub fn save(encoded: &EncodedImage, output_dir: &Path, filename: &str) -> Result<PathBuf, String> {
        std::fs::create_dir_all(output_dir)
            .map_err(|e| format!("Failed to create {}: {}", output_dir.display(), e))?;

        let filepath = output_dir.join(filename);
        let temp_path = output_dir.join(format!(".{}.partial", filename));

        info!(path = %filepath.display(), "Saving image");

        if let Err(e) = std::fs::write(&temp_path, &encoded.data) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(format!("Failed to save image: {}", e));
        }
        if let Err(e) = std::fs::rename(&temp_path, &filepath) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(format!("Failed to save image: {}", e));
        }

        info!(path = %filepath.display(), "Image saved successfully");
        Ok(filepath)
    }
}

/// File name of an exported frame: `photobooth-<unix millis>.png`
pub fn artifact_filename(timestamp_millis: i64) -> String {
    format!(
        "{}-{}.{}",
        export::FILE_PREFIX,
        timestamp_millis,
        export::FILE_EXTENSION
    )
}

/// Artifact file name for the current time
pub fn timestamped_filename() -> String {
    artifact_filename(chrono::Utc::now().timestamp_millis())
}
