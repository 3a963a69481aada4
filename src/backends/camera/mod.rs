// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ Capture controller   │  snapshot()
//! └──────────┬───────────┘
//!            ▼
//! ┌──────────────────────┐
//! │ CameraHandle         │  ← scoped ownership, release exactly once
//! └──────────┬───────────┘
//!            ▼
//! ┌──────────────────────┐
//! │ CameraSource trait   │  ← acquire / latest frame / release
//! └──────────┬───────────┘
//!       ┌────┴─────┐
//!       ▼          ▼
//!    V4L2       Still / pattern
//! ```

pub mod format_converters;
pub mod still;
pub mod types;
#[cfg(target_os = "linux")]
pub mod v4l2;

pub use still::StillCamera;
pub use types::*;

use crate::errors::CameraError;
use crate::pipelines::photo::{CapturedImage, PhotoCapture};
use tracing::{info, warn};

/// A device (or virtual device) that produces a live video feed
///
/// Sources are driven through a [`CameraHandle`]; the handle guarantees
/// `release` is called exactly once after a successful `acquire`.
pub trait CameraSource: Send {
    /// Human-readable name for logs and the UI
    fn name(&self) -> String;

    /// Open the device and start streaming
    ///
    /// # Returns
    /// * `Ok(())` - Stream started (frames may arrive later)
    /// * `Err(CameraError::PermissionDenied)` - Access refused
    /// * `Err(CameraError::DeviceNotFound)` - No such device
    /// * `Err(CameraError::DeviceError)` - Any other failure
    fn acquire(&mut self) -> Result<(), CameraError>;

    /// Most recent frame, `None` until the stream delivered its first one
    fn latest_frame(&mut self) -> Option<CameraFrame>;

    /// Frame to use for a photo
    ///
    /// Defaults to the latest preview frame; sources that hold a sequence of
    /// stills advance to the next one here.
    fn capture_frame(&mut self) -> Option<CameraFrame> {
        self.latest_frame()
    }

    /// Stop streaming and close the device
    fn release(&mut self);
}

/// Anything that can take a photo for the capture sequence
pub trait SnapshotSource {
    /// Capture the current frame; `None` when the stream is not ready
    fn snapshot(&mut self) -> Option<CapturedImage>;
}

impl<F> SnapshotSource for F
where
    F: FnMut() -> Option<CapturedImage>,
{
    fn snapshot(&mut self) -> Option<CapturedImage> {
        self()
    }
}

/// Scoped ownership of an acquired camera stream
///
/// Dropping the handle releases the device, so every exit path (success,
/// error, cancellation) turns the camera off.
pub struct CameraHandle {
    source: Box<dyn CameraSource>,
    mirror: bool,
    released: bool,
}

impl CameraHandle {
    /// Acquire `source` and wrap it
    ///
    /// A source whose acquisition fails is dropped without `release`.
    pub fn acquire(mut source: Box<dyn CameraSource>, mirror: bool) -> Result<Self, CameraError> {
        let name = source.name();
        info!(camera = %name, "Acquiring camera");
        source.acquire()?;
        info!(camera = %name, mirror, "Camera stream started");
        Ok(Self {
            source,
            mirror,
            released: false,
        })
    }

    pub fn name(&self) -> String {
        self.source.name()
    }

    /// Readiness gate: true once the stream delivered a frame
    pub fn is_ready(&mut self) -> bool {
        self.source.latest_frame().is_some()
    }

    /// Latest frame for a live preview (unmirrored; mirror when drawing)
    pub fn preview(&mut self) -> Option<CameraFrame> {
        self.source.latest_frame()
    }

    pub fn mirror(&self) -> bool {
        self.mirror
    }

    /// Stop the stream now instead of at drop
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        info!(camera = %self.source.name(), "Releasing camera");
        self.source.release();
    }
}

impl SnapshotSource for CameraHandle {
    fn snapshot(&mut self) -> Option<CapturedImage> {
        let Some(frame) = self.source.capture_frame() else {
            warn!(camera = %self.source.name(), "Snapshot refused: camera not ready");
            return None;
        };
        match PhotoCapture::from_frame(&frame, self.mirror) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!(error = %e, "Snapshot failed");
                None
            }
        }
    }
}

impl Drop for CameraHandle {
    fn drop(&mut self) {
        self.release_inner();
    }
}

/// List video capture devices on this system
pub fn enumerate_cameras() -> Vec<CameraDevice> {
    #[cfg(target_os = "linux")]
    {
        v4l2::enumerate_devices()
    }
    #[cfg(not(target_os = "linux"))]
    {
        Vec::new()
    }
}

/// Build the source described by `spec`
///
/// Nothing is opened here; errors surface from `acquire`.
pub fn open_camera(spec: &CameraSpec, width: u32, height: u32) -> Box<dyn CameraSource> {
    match spec {
        CameraSpec::Auto => match enumerate_cameras().into_iter().next() {
            Some(device) => device_source(device.path, width, height),
            None => {
                info!("No video devices found, using test pattern");
                Box::new(StillCamera::pattern(width, height))
            }
        },
        CameraSpec::Device(path) => device_source(path.clone(), width, height),
        CameraSpec::Still(dir) => Box::new(StillCamera::from_dir(dir.clone())),
        CameraSpec::Pattern => Box::new(StillCamera::pattern(width, height)),
    }
}

#[cfg(target_os = "linux")]
fn device_source(path: std::path::PathBuf, width: u32, height: u32) -> Box<dyn CameraSource> {
    Box::new(v4l2::V4l2Camera::new(path, width, height))
}

#[cfg(not(target_os = "linux"))]
fn device_source(path: std::path::PathBuf, _width: u32, _height: u32) -> Box<dyn CameraSource> {
    Box::new(Unsupported { path })
}

/// Placeholder source for platforms without a device backend
#[cfg(not(target_os = "linux"))]
struct Unsupported {
    path: std::path::PathBuf,
}

#[cfg(not(target_os = "linux"))]
impl CameraSource for Unsupported {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn acquire(&mut self) -> Result<(), CameraError> {
        Err(CameraError::DeviceNotFound(format!(
            "{}: device capture is only supported on Linux",
            self.path.display()
        )))
    }

    fn latest_frame(&mut self) -> Option<CameraFrame> {
        None
    }

    fn release(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        fail: Option<CameraError>,
        ready: bool,
        releases: Arc<AtomicUsize>,
    }

    impl CameraSource for CountingSource {
        fn name(&self) -> String {
            "counting".to_string()
        }

        fn acquire(&mut self) -> Result<(), CameraError> {
            match self.fail.take() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }

        fn latest_frame(&mut self) -> Option<CameraFrame> {
            self.ready
                .then(|| CameraFrame::from_rgba(2, 1, vec![255, 0, 0, 255, 0, 255, 0, 255]))
        }

        fn release(&mut self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn source(ready: bool, fail: Option<CameraError>) -> (Box<CountingSource>, Arc<AtomicUsize>) {
        let releases = Arc::new(AtomicUsize::new(0));
        let src = Box::new(CountingSource {
            fail,
            ready,
            releases: Arc::clone(&releases),
        });
        (src, releases)
    }

    #[test]
    fn test_drop_releases_once() {
        let (src, releases) = source(true, None);
        let handle = CameraHandle::acquire(src, true).unwrap();
        drop(handle);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_explicit_release_is_not_repeated_by_drop() {
        let (src, releases) = source(true, None);
        let handle = CameraHandle::acquire(src, true).unwrap();
        handle.release();
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_acquire_is_distinct_and_not_released() {
        let (src, releases) = source(true, Some(CameraError::PermissionDenied("no".into())));
        let err = CameraHandle::acquire(src, true).err().unwrap();
        assert!(matches!(err, CameraError::PermissionDenied(_)));
        assert_eq!(releases.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_snapshot_refused_before_ready() {
        let (src, _) = source(false, None);
        let mut handle = CameraHandle::acquire(src, true).unwrap();
        assert!(!handle.is_ready());
        assert!(handle.snapshot().is_none());
    }

    #[test]
    fn test_snapshot_is_mirrored_when_ready() {
        let (src, _) = source(true, None);
        let mut handle = CameraHandle::acquire(src, true).unwrap();
        let image = handle.snapshot().unwrap();
        assert_eq!(image.pixels().get_pixel(0, 0).0, [0, 255, 0, 255]);
    }

    #[test]
    fn test_closure_snapshot_source() {
        let mut calls = 0;
        let mut source = || -> Option<CapturedImage> {
            calls += 1;
            None
        };
        assert!(source.snapshot().is_none());
        assert_eq!(calls, 1);
    }
}
