// SPDX-License-Identifier: GPL-3.0-only

//! Photobooth application core
//!
//! [`AppState`] holds what is shown and changes only through pure reducers.
//! [`Photobooth`] is the host around it: it owns the camera handle and the
//! exporter and performs the effects the reducers ask for.
//!
//! ```text
//! key press / timer ──Action──► AppState::update ──Effect──► Photobooth
//!                                                   │
//!                      acquire / release camera ◄───┤
//!                      export job (async)       ◄───┘
//! ```

pub mod state;
mod update;

pub use state::{Action, AppState, Effect, Notice, NoticeLevel, ViewState};

use crate::backends::camera::{CameraFrame, CameraHandle, CameraSource};
use crate::errors::ExportError;
use crate::pipelines::frame::FrameTree;
use crate::pipelines::photo::{Exporter, ImageArtifact};
use crate::sequence::SequenceUpdate;
use std::time::Duration;
use tracing::{debug, info};

/// Builds a fresh camera source for each session
pub type CameraFactory = Box<dyn FnMut() -> Box<dyn CameraSource> + Send>;

/// Export requested by a `Download`, to be run off the UI loop
///
/// Feed the result back with [`Action::ExportFinished`].
pub struct ExportJob {
    exporter: Exporter,
    tree: FrameTree,
}

impl ExportJob {
    pub fn tree(&self) -> &FrameTree {
        &self.tree
    }

    pub async fn run(self) -> Result<ImageArtifact, ExportError> {
        self.exporter.export(self.tree).await
    }
}

/// Host for the application state
pub struct Photobooth {
    state: AppState,
    camera: Option<CameraHandle>,
    factory: CameraFactory,
    mirror: bool,
    exporter: Exporter,
}

impl Photobooth {
    pub fn new(state: AppState, factory: CameraFactory, mirror: bool, exporter: Exporter) -> Self {
        Self {
            state,
            camera: None,
            factory,
            mirror,
            exporter,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn exporter(&self) -> &Exporter {
        &self.exporter
    }

    /// Whether photos (and so the live preview) are mirrored
    pub fn mirror(&self) -> bool {
        self.mirror
    }

    /// True while a camera stream is held
    pub fn camera_active(&self) -> bool {
        self.camera.is_some()
    }

    /// Apply an action and perform its effect
    ///
    /// Returns the export job when the action was an accepted `Download`.
    pub fn dispatch(&mut self, action: Action) -> Option<ExportJob> {
        let effect = self.state.update(action);
        self.perform(effect)
    }

    fn perform(&mut self, effect: Effect) -> Option<ExportJob> {
        match effect {
            Effect::None => None,
            Effect::AcquireCamera => {
                self.release_camera();
                let source = (self.factory)();
                match CameraHandle::acquire(source, self.mirror) {
                    Ok(handle) => self.camera = Some(handle),
                    Err(err) => {
                        let effect = self.state.update(Action::CameraFailed(err));
                        return self.perform(effect);
                    }
                }
                None
            }
            Effect::ReleaseCamera => {
                self.release_camera();
                None
            }
            Effect::Export(tree) => Some(ExportJob {
                exporter: self.exporter.clone(),
                tree,
            }),
        }
    }

    fn release_camera(&mut self) {
        if let Some(handle) = self.camera.take() {
            handle.release();
        }
    }

    /// Advance the capture sequence by `elapsed`
    ///
    /// Every update is fed back through the reducer before returning.
    pub fn tick(&mut self, elapsed: Duration) -> Vec<SequenceUpdate> {
        if self.state.view != ViewState::Capturing {
            return Vec::new();
        }
        let Some(camera) = self.camera.as_mut() else {
            debug!("Tick without a camera");
            return Vec::new();
        };
        let updates = self.state.capture.advance(elapsed, camera);
        for update in &updates {
            self.dispatch(Action::Sequence(update.clone()));
        }
        updates
    }

    /// Time until the sequence needs the next tick
    pub fn time_until_next(&self) -> Option<Duration> {
        match self.state.view {
            ViewState::Capturing => self.state.capture.time_until_next(),
            _ => None,
        }
    }

    /// Latest live frame while capturing
    pub fn preview(&mut self) -> Option<CameraFrame> {
        self.camera.as_mut().and_then(|camera| camera.preview())
    }

    /// Run a download to completion on the current task
    pub async fn download(&mut self) -> Option<Result<ImageArtifact, ExportError>> {
        let job = self.dispatch(Action::Download)?;
        info!(layout = job.tree().layout.id(), "Downloading frame");
        let result = job.run().await;
        self.dispatch(Action::ExportFinished(result.clone()));
        Some(result)
    }
}
