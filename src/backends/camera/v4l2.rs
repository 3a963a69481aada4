// SPDX-License-Identifier: GPL-3.0-only

//! Direct V4L2 webcam capture
//!
//! The device is opened and configured synchronously in `acquire` so that
//! permission and availability problems surface as typed errors. Streaming
//! then runs on a dedicated thread that converts each buffer to RGBA and
//! pushes it through a bounded channel; the newest frame wins. `release`
//! waits a bounded time for that thread to close the device.

use super::format_converters::to_frame;
use super::types::{CameraDevice, CameraFrame, PixelFormat};
use super::CameraSource;
use crate::constants::capture::{
    FRAME_CHANNEL_DEPTH, FRAME_LOG_INTERVAL, RELEASE_JOIN_TIMEOUT_MS, V4L2_BUFFER_COUNT,
};
use crate::errors::CameraError;
use futures::channel::mpsc;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use v4l::FourCC;
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

/// Webcam source backed by a V4L2 device node
pub struct V4l2Camera {
    path: PathBuf,
    width: u32,
    height: u32,
    running: Arc<AtomicBool>,
    receiver: Option<mpsc::Receiver<CameraFrame>>,
    latest: Option<CameraFrame>,
    worker: Option<JoinHandle<()>>,
}

impl V4l2Camera {
    pub fn new(path: PathBuf, width: u32, height: u32) -> Self {
        Self {
            path,
            width,
            height,
            running: Arc::new(AtomicBool::new(false)),
            receiver: None,
            latest: None,
            worker: None,
        }
    }

    /// Negotiate a format, preferring YUYV at the requested size
    fn configure(&self, dev: &Device) -> Result<(PixelFormat, u32, u32), CameraError> {
        let context = self.path.display().to_string();
        let mut format = dev
            .format()
            .map_err(|e| CameraError::from_io(&context, &e))?;

        for preferred in PixelFormat::PREFERRED {
            format.width = self.width;
            format.height = self.height;
            format.fourcc = FourCC::new(preferred.fourcc());
            match dev.set_format(&format) {
                Ok(applied) => {
                    if let Some(pixel_format) = PixelFormat::from_fourcc(&applied.fourcc.repr) {
                        info!(
                            width = applied.width,
                            height = applied.height,
                            fourcc = %applied.fourcc,
                            "Set V4L2 format"
                        );
                        return Ok((pixel_format, applied.width, applied.height));
                    }
                    debug!(requested = %format.fourcc, got = %applied.fourcc, "Format not accepted");
                }
                Err(e) => warn!(error = %e, fourcc = %format.fourcc, "Could not set format"),
            }
        }

        Err(CameraError::DeviceError(format!(
            "{}: no supported pixel format (YUYV, MJPG, RGB3)",
            context
        )))
    }
}

impl CameraSource for V4l2Camera {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn acquire(&mut self) -> Result<(), CameraError> {
        let context = self.path.display().to_string();
        info!(device_path = %context, "Opening V4L2 device");

        let dev = Device::with_path(&self.path).map_err(|e| CameraError::from_io(&context, &e))?;
        let caps = dev
            .query_caps()
            .map_err(|e| CameraError::from_io(&context, &e))?;
        info!(card = %caps.card, driver = %caps.driver, "Device capabilities");

        let (pixel_format, width, height) = self.configure(&dev)?;

        let (sender, receiver) = mpsc::channel(FRAME_CHANNEL_DEPTH);
        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);

        let worker = std::thread::Builder::new()
            .name("v4l2-capture".to_string())
            .spawn(move || {
                if let Err(e) = capture_loop(dev, pixel_format, width, height, sender, running) {
                    error!(error = %e, "Capture loop failed");
                }
            })
            .map_err(|e| CameraError::DeviceError(format!("failed to spawn capture thread: {}", e)))?;

        self.worker = Some(worker);
        self.receiver = Some(receiver);
        self.latest = None;
        Ok(())
    }

    fn latest_frame(&mut self) -> Option<CameraFrame> {
        if let Some(receiver) = self.receiver.as_mut() {
            while let Ok(frame) = receiver.try_recv() {
                self.latest = Some(frame);
            }
        }
        self.latest.clone()
    }

    fn release(&mut self) {
        info!(device_path = %self.path.display(), "Stopping V4L2 capture");
        // The thread exits at its next buffer and drops the device
        self.running.store(false, Ordering::SeqCst);
        self.receiver = None;
        self.latest = None;

        if let Some(worker) = self.worker.take()
            && !join_with_timeout(worker, Duration::from_millis(RELEASE_JOIN_TIMEOUT_MS))
        {
            warn!(
                device_path = %self.path.display(),
                timeout_ms = RELEASE_JOIN_TIMEOUT_MS,
                "Capture thread still blocked on the device after release"
            );
        }
    }
}

impl Drop for V4l2Camera {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Join `worker` if it finishes within `timeout`
///
/// Returns false when the thread is still running; it is then left detached.
fn join_with_timeout(worker: JoinHandle<()>, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while !worker.is_finished() {
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    if worker.join().is_err() {
        error!("Capture thread panicked");
    }
    true
}

fn capture_loop(
    mut dev: Device,
    pixel_format: PixelFormat,
    width: u32,
    height: u32,
    mut sender: mpsc::Sender<CameraFrame>,
    running: Arc<AtomicBool>,
) -> std::io::Result<()> {
    let mut stream = MmapStream::with_buffers(&mut dev, Type::VideoCapture, V4L2_BUFFER_COUNT)?;
    info!(?pixel_format, width, height, "V4L2 capture stream started");

    let mut frame_num: u64 = 0;
    while running.load(Ordering::SeqCst) {
        let started = Instant::now();
        match stream.next() {
            Ok((buf, meta)) => {
                frame_num += 1;
                let Some(frame) = to_frame(pixel_format, buf, width, height) else {
                    continue;
                };
                match sender.try_send(frame) {
                    Ok(()) => {
                        if frame_num % FRAME_LOG_INTERVAL == 0 {
                            debug!(
                                frame = frame_num,
                                sequence = meta.sequence,
                                size = buf.len(),
                                elapsed_us = started.elapsed().as_micros(),
                                "Frame captured"
                            );
                        }
                    }
                    // Receiver gone: the source was released
                    Err(e) if e.is_disconnected() => break,
                    Err(_) => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to capture frame");
                std::thread::sleep(std::time::Duration::from_millis(10));
            }
        }
    }

    info!("V4L2 capture loop ended");
    Ok(())
}

/// Enumerate V4L2 video capture nodes
pub fn enumerate_devices() -> Vec<CameraDevice> {
    let mut devices: Vec<CameraDevice> = v4l::context::enum_devices()
        .into_iter()
        .filter_map(|node| {
            let path = node.path().to_path_buf();
            let dev = Device::with_path(&path).ok()?;
            let caps = dev.query_caps().ok()?;
            if !caps
                .capabilities
                .contains(v4l::capability::Flags::VIDEO_CAPTURE)
            {
                return None;
            }
            Some(CameraDevice {
                name: node.name().unwrap_or_else(|| caps.card.clone()),
                path,
                driver: caps.driver,
            })
        })
        .collect();
    devices.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(count = devices.len(), "Enumerated V4L2 devices");
    devices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_with_timeout_waits_for_exit() {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let worker = std::thread::spawn(move || {
            while flag.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(1));
            }
        });
        running.store(false, Ordering::SeqCst);
        assert!(join_with_timeout(worker, Duration::from_secs(5)));
    }

    #[test]
    fn test_join_with_timeout_gives_up_on_stuck_thread() {
        let (tx, rx) = std::sync::mpsc::channel::<()>();
        // Blocks like a capture thread waiting on a stalled device
        let worker = std::thread::spawn(move || {
            let _ = rx.recv();
        });
        assert!(!join_with_timeout(worker, Duration::from_millis(20)));
        drop(tx);
    }

    #[test]
    fn test_release_without_acquire_is_harmless() {
        let mut cam = V4l2Camera::new(PathBuf::from("/dev/video-does-not-exist"), 640, 480);
        cam.release();
        assert!(cam.latest_frame().is_none());
    }

    #[test]
    fn test_missing_device_is_not_found() {
        let mut cam = V4l2Camera::new(PathBuf::from("/dev/video-does-not-exist"), 640, 480);
        let err = cam.acquire().unwrap_err();
        assert!(matches!(err, CameraError::DeviceNotFound(_)));
        assert!(cam.latest_frame().is_none());
    }
}
