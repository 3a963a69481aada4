// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! - Listing camera devices
//! - Running one headless capture session
//! - Serving the web client bundle

use photobooth::app::{AppState, Photobooth};
use photobooth::backends::camera::{CameraHandle, CameraSpec, enumerate_cameras, open_camera};
use photobooth::config::Config;
use photobooth::constants::server;
use photobooth::delivery::StaticServer;
use photobooth::pipelines::frame::{FrameStyle, Layout, PresetId, Rgb, compose};
use photobooth::pipelines::photo::Exporter;
use photobooth::sequence::{CaptureController, SequenceTiming, SequenceUpdate, run_sequence};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// How long `shoot` waits for the first frame
const READY_TIMEOUT: Duration = Duration::from_secs(5);

/// List all available cameras
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let cameras = enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        println!("Use --camera pattern or --camera still:<dir> to run without one.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        println!("      Path:   {}", camera.path.display());
        println!("      Driver: {}", camera.driver);
        println!();
    }

    Ok(())
}

/// Options for a headless session
pub struct ShootOptions {
    pub camera: Option<CameraSpec>,
    pub layout: Layout,
    pub preset: Option<PresetId>,
    pub color: Option<Rgb>,
    pub output: Option<PathBuf>,
}

/// Run one complete session: four timed shots, compose, export
pub fn shoot(config: &Config, options: ShootOptions) -> Result<(), Box<dyn std::error::Error>> {
    let spec = options.camera.unwrap_or_else(|| config.capture.camera.clone());
    let output_dir = options
        .output
        .unwrap_or_else(|| config.export.output_dir.clone());
    let style = match (options.color, options.preset) {
        (Some(color), _) => FrameStyle::custom(color),
        (None, Some(preset)) => FrameStyle::Preset { preset },
        (None, None) => FrameStyle::default(),
    };

    let source = open_camera(&spec, config.capture.width, config.capture.height);
    let mut camera = CameraHandle::acquire(source, config.capture.mirror)?;
    println!("Using camera: {}", camera.name());

    // Wait for the stream to deliver its first frame
    let start = Instant::now();
    while !camera.is_ready() {
        if start.elapsed() > READY_TIMEOUT {
            return Err("Camera did not deliver a frame".into());
        }
        std::thread::sleep(Duration::from_millis(16));
    }

    let rt = tokio::runtime::Runtime::new()?;
    let mut controller = CaptureController::new(SequenceTiming::default());

    rt.block_on(run_sequence(&mut controller, &mut camera, |update| match update {
        SequenceUpdate::Countdown(Some(n)) => println!("  {}...", n),
        SequenceUpdate::Captured { progress, .. } => println!("Photo {} taken", progress),
        SequenceUpdate::Aborted(err) => warn!(error = %err, "Sequence aborted"),
        _ => {}
    }))?;
    camera.release();

    let images = controller.take_images();
    let tree = compose(&images, &style, options.layout).with_caption(config.export.caption.clone());
    let exporter = Exporter::new(output_dir, config.export.scale);
    let artifact = rt.block_on(exporter.export(tree))?;

    println!("Saved: {}", artifact.path.display());
    Ok(())
}

/// Serve the client bundle until Ctrl-C
pub fn serve(
    config: &Config,
    port: Option<u16>,
    dir: Option<PathBuf>,
    open_browser: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let port = config.serve_port(port, std::env::var(server::PORT_ENV).ok().as_deref())?;
    let root = dir.unwrap_or_else(|| config.server.bundle_dir.clone());

    let server = StaticServer::bind(&config.server.host, port, root)?;
    let shutdown = server.shutdown_flag();
    ctrlc::set_handler(move || shutdown.store(true, Ordering::SeqCst))?;

    println!("=================================================");
    println!("  Photobooth running at {}", server.url());
    println!("  Serving files from {}", server.root().display());
    println!("=================================================");

    if open_browser && let Err(e) = open::that(server.url()) {
        warn!(error = %e, "Failed to open browser");
    }

    server.run()?;
    Ok(())
}

/// Build the interactive shell's host from the configuration
pub fn build_photobooth(config: &Config, camera: Option<CameraSpec>) -> Photobooth {
    let spec = camera.unwrap_or_else(|| config.capture.camera.clone());
    let (width, height) = (config.capture.width, config.capture.height);
    info!(camera = %spec, "Camera source selected");

    let factory = Box::new(move || open_camera(&spec, width, height));
    let state = AppState::new(SequenceTiming::default(), config.export.caption.clone());
    let exporter = Exporter::new(config.export.output_dir.clone(), config.export.scale);
    Photobooth::new(state, factory, config.capture.mirror, exporter)
}
