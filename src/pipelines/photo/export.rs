// SPDX-License-Identifier: GPL-3.0-only

//! Frame export
//!
//! Renders a composed frame at the export scale, encodes it as PNG and saves
//! it as `photobooth-<timestamp>.png`. Rendering and disk I/O run on the
//! blocking pool so the caller's loop stays responsive; an "in progress" flag
//! is exposed for the duration so duplicate requests can be refused.

use super::encoding::{PhotoEncoder, timestamped_filename};
use crate::errors::ExportError;
use crate::pipelines::frame::{FrameTree, render};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};

/// A saved export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArtifact {
    pub path: PathBuf,
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
}

/// Clears the in-progress flag on every exit path
struct InProgressGuard {
    flag: Arc<AtomicBool>,
}

impl InProgressGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self, ExportError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ExportError::AlreadyInProgress)?;
        Ok(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for InProgressGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Exports composed frames to an output directory
#[derive(Debug, Clone)]
pub struct Exporter {
    output_dir: PathBuf,
    scale: u32,
    in_progress: Arc<AtomicBool>,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>, scale: u32) -> Self {
        Self {
            output_dir: output_dir.into(),
            scale: scale.max(1),
            in_progress: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// True while an export is rendering or writing
    pub fn is_in_progress(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// Render, encode and save a frame
    ///
    /// On failure nothing is left in the output directory.
    pub async fn export(&self, tree: FrameTree) -> Result<ImageArtifact, ExportError> {
        let _guard = InProgressGuard::acquire(&self.in_progress)?;

        info!(
            layout = tree.layout.id(),
            style = %tree.style.name(),
            scale = self.scale,
            "Starting export"
        );

        let output_dir = self.output_dir.clone();
        let scale = self.scale;

        let result = tokio::task::spawn_blocking(move || Self::export_sync(&tree, scale, &output_dir))
            .await
            .map_err(|e| ExportError::RenderFailure(format!("Export task error: {}", e)))
            .and_then(|r| r);

        match &result {
            Ok(artifact) => info!(path = %artifact.path.display(), "Export complete"),
            Err(e) => error!(error = %e, "Export failed"),
        }
        result
    }

    fn export_sync(tree: &FrameTree, scale: u32, output_dir: &Path) -> Result<ImageArtifact, ExportError> {
        let image = render(tree, scale);
        let encoded = PhotoEncoder::encode(&image).map_err(ExportError::RenderFailure)?;
        let filename = timestamped_filename();
        let path =
            PhotoEncoder::save(&encoded, output_dir, &filename).map_err(ExportError::RenderFailure)?;

        Ok(ImageArtifact {
            path,
            filename,
            width: encoded.width,
            height: encoded.height,
            size_bytes: encoded.data.len(),
        })
    }
}
