// SPDX-License-Identifier: GPL-3.0-only

//! Photo pipeline
//!
//! ```text
//! CameraFrame → capture (mirror + PNG) → CapturedImage
//! FrameTree   → export (render ×scale → PNG → disk) → ImageArtifact
//! ```

pub mod capture;
pub mod encoding;
pub mod export;

pub use capture::{CapturedImage, PhotoCapture};
pub use encoding::{EncodedImage, PhotoEncoder, artifact_filename, timestamped_filename};
pub use export::{Exporter, ImageArtifact};
