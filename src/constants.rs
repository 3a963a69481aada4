// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Number of photos in one session
pub const SLOT_COUNT: usize = 4;

/// Capture-sequence timing
pub mod sequence {
    use super::Duration;

    /// Lead-in before the first countdown of a session
    pub const FIRST_LEAD_IN: Duration = Duration::from_millis(500);

    /// Lead-in before every later countdown, leaves time to react to the
    /// "shot taken" feedback
    pub const LEAD_IN: Duration = Duration::from_millis(1500);

    /// Duration each countdown number stays on screen
    pub const COUNTDOWN_TICK: Duration = Duration::from_millis(1000);

    /// Delay between clearing the countdown and the snapshot, keeps the
    /// overlay out of the picture
    pub const SETTLE_DELAY: Duration = Duration::from_millis(200);

    /// First number shown by the countdown
    pub const COUNTDOWN_FROM: u8 = 3;
}

/// Camera defaults
pub mod capture {
    /// Requested capture width
    pub const DEFAULT_WIDTH: u32 = 640;

    /// Requested capture height
    pub const DEFAULT_HEIGHT: u32 = 480;

    /// Number of mmap buffers for V4L2 streaming
    pub const V4L2_BUFFER_COUNT: u32 = 4;

    /// Frame channel depth between the capture thread and the source
    pub const FRAME_CHANNEL_DEPTH: usize = 4;

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 60;

    /// How long `release` waits for the capture thread to close the device
    pub const RELEASE_JOIN_TIMEOUT_MS: u64 = 500;
}

/// Frame geometry (logical pixels, before export scaling)
pub mod frame {
    /// Outer border width
    pub const BORDER: u32 = 4;

    /// Padding between border and photo grid
    pub const PADDING: u32 = 12;

    /// Gap between photo cells
    pub const GAP: u32 = 6;

    /// Height of the caption footer
    pub const FOOTER_HEIGHT: u32 = 20;

    /// Frame width of the 2x2 grid layout
    pub const GRID_WIDTH: u32 = 350;

    /// Frame width of the 1x4 strip layout
    pub const STRIP_WIDTH: u32 = 200;

    /// Default footer caption
    pub const DEFAULT_CAPTION: &str = "Your Brand / Text Here";

    /// Opacity of the placeholder numbers
    pub const PLACEHOLDER_TEXT_ALPHA: f32 = 0.5;

    /// Opacity of the caption text
    pub const CAPTION_TEXT_ALPHA: f32 = 0.75;

    /// Darkening applied to empty cells
    pub const PLACEHOLDER_SHADE: f32 = 0.05;

    /// Opacity of the thin cell outline
    pub const CELL_OUTLINE_ALPHA: f32 = 0.1;
}

/// Export settings
pub mod export {
    /// Resolution multiplier applied when exporting a frame
    pub const SCALE: u32 = 2;

    /// Upper bound for a configured scale factor
    pub const MAX_SCALE: u32 = 8;

    /// Prefix of exported file names
    pub const FILE_PREFIX: &str = "photobooth";

    /// Extension of exported file names
    pub const FILE_EXTENSION: &str = "png";

    /// Default directory name under the user's pictures directory
    pub const DIRECTORY_NAME: &str = "photobooth";
}

/// Static delivery settings
pub mod server {
    /// Port used when neither config nor environment sets one
    pub const DEFAULT_PORT: u16 = 3001;

    /// Environment variable overriding the port
    pub const PORT_ENV: &str = "PORT";

    /// Interface the server listens on
    pub const DEFAULT_HOST: &str = "0.0.0.0";

    /// Bundle directory relative to the working directory
    pub const DEFAULT_BUNDLE_DIR: &str = "client/dist";

    /// Single-page-app entry document
    pub const ENTRY_DOCUMENT: &str = "index.html";

    /// Poll interval so the accept loop notices shutdown
    pub const ACCEPT_POLL_MS: u64 = 200;

    /// Body returned when the entry document is missing
    pub const MISSING_ENTRY_MESSAGE: &str = "The application entry page was not found. Make sure the client bundle has been built (npm run build in the client folder).";

    /// Body returned on any other failure
    pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred while loading the application.";
}

/// Supported file formats for the still-image camera source
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }

    /// Content type for a served file, by extension
    pub fn mime_type(ext: &str) -> &'static str {
        match ext.to_lowercase().as_str() {
            "html" | "htm" => "text/html; charset=utf-8",
            "js" | "mjs" => "text/javascript; charset=utf-8",
            "css" => "text/css; charset=utf-8",
            "json" | "map" => "application/json",
            "webmanifest" => "application/manifest+json",
            "txt" => "text/plain; charset=utf-8",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "svg" => "image/svg+xml",
            "ico" => "image/x-icon",
            "woff" => "font/woff",
            "woff2" => "font/woff2",
            "ttf" => "font/ttf",
            "wasm" => "application/wasm",
            _ => "application/octet-stream",
        }
    }
}

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_types() {
        assert_eq!(file_formats::mime_type("HTML"), "text/html; charset=utf-8");
        assert_eq!(file_formats::mime_type("png"), "image/png");
        assert_eq!(file_formats::mime_type("unknown"), "application/octet-stream");
    }

    #[test]
    fn test_step_duration() {
        // Three countdown ticks plus the settle delay
        let step = sequence::COUNTDOWN_TICK * sequence::COUNTDOWN_FROM as u32 + sequence::SETTLE_DELAY;
        assert_eq!(step, Duration::from_millis(3200));
    }
}
