// SPDX-License-Identifier: GPL-3.0-only

//! State transitions
//!
//! | View        | Action                 | Next view   | Effect         |
//! |-------------|------------------------|-------------|----------------|
//! | Start       | StartSequence          | Capturing   | AcquireCamera  |
//! | Capturing   | CameraFailed           | Start       | -              |
//! | Capturing   | Sequence(Completed)    | Customizing | ReleaseCamera  |
//! | Capturing   | Sequence(Aborted)      | Start       | ReleaseCamera  |
//! | Capturing   | Reset                  | Start       | ReleaseCamera  |
//! | Customizing | Confirm                | Result      | -              |
//! | Result      | Download               | Result      | Export         |
//! | Customizing, Result | Reset          | Start       | -              |
//!
//! Reset is refused while an export is running, and an export result only
//! lands in the result view.
//!
//! Anything else is ignored and logged at debug level.

use super::state::{Action, AppState, Effect, Notice, ViewState};
use crate::constants::SLOT_COUNT;
use crate::pipelines::frame::{FrameStyle, Layout, Rgb, reorder};
use crate::sequence::SequenceUpdate;
use tracing::{debug, error, info, warn};

impl AppState {
    /// Apply one action and return the effect the host must perform
    pub fn update(&mut self, action: Action) -> Effect {
        match action {
            Action::StartSequence => self.handle_start(),
            Action::CameraFailed(err) => {
                if self.view != ViewState::Capturing {
                    return self.ignore("CameraFailed");
                }
                warn!(error = %err, "Camera unavailable");
                self.capture.reset();
                self.view = ViewState::Start;
                self.notice = Some(Notice::error(err.user_message()));
                Effect::None
            }
            Action::Sequence(update) => self.handle_sequence(update),
            Action::SelectLayout(layout) => {
                if self.view != ViewState::Customizing {
                    return self.ignore("SelectLayout");
                }
                info!(layout = layout.id(), "Layout selected");
                self.layout = layout;
                Effect::None
            }
            Action::SelectPreset(preset) => {
                if self.view != ViewState::Customizing {
                    return self.ignore("SelectPreset");
                }
                info!(preset = preset.display_name(), "Preset selected");
                self.style = FrameStyle::Preset { preset };
                Effect::None
            }
            Action::SetCustomColor(color) => {
                if self.view != ViewState::Customizing {
                    return self.ignore("SetCustomColor");
                }
                info!(color = %color, "Custom color selected");
                self.custom_color = color;
                self.style = FrameStyle::custom(color);
                Effect::None
            }
            Action::Reorder { from, to } => {
                if self.view != ViewState::Customizing {
                    return self.ignore("Reorder");
                }
                debug!(from, to, "Reordering photos");
                self.images = reorder(&self.images, from, to);
                Effect::None
            }
            Action::Confirm => {
                if self.view != ViewState::Customizing || self.images.len() != SLOT_COUNT {
                    return self.ignore("Confirm");
                }
                self.view = ViewState::Result;
                Effect::None
            }
            Action::Download => {
                if self.view != ViewState::Result || self.is_downloading {
                    return self.ignore("Download");
                }
                self.is_downloading = true;
                Effect::Export(self.frame_tree())
            }
            Action::ExportFinished(result) => {
                self.is_downloading = false;
                if self.view != ViewState::Result {
                    debug!(view = ?self.view, "Dropping export result outside the result view");
                    return Effect::None;
                }
                match result {
                    Ok(artifact) => {
                        info!(path = %artifact.path.display(), "Frame saved");
                        self.notice = Some(Notice::info(format!("Saved {}", artifact.filename)));
                        self.last_artifact = Some(artifact);
                    }
                    Err(err) => {
                        error!(error = %err, "Export failed");
                        self.notice = Some(Notice::error(format!(
                            "Failed to generate the image: {}",
                            err
                        )));
                    }
                }
                Effect::None
            }
            Action::Reset => self.handle_reset(),
            Action::DismissNotice => {
                self.notice = None;
                Effect::None
            }
        }
    }

    fn handle_start(&mut self) -> Effect {
        if self.view != ViewState::Start {
            return self.ignore("StartSequence");
        }
        if let Err(err) = self.capture.start() {
            warn!(error = %err, "Cannot start capture");
            return Effect::None;
        }
        self.notice = None;
        self.images.clear();
        self.view = ViewState::Capturing;
        Effect::AcquireCamera
    }

    fn handle_sequence(&mut self, update: SequenceUpdate) -> Effect {
        if self.view != ViewState::Capturing {
            return self.ignore("Sequence");
        }
        match update {
            SequenceUpdate::Countdown(_) | SequenceUpdate::Captured { .. } => Effect::None,
            SequenceUpdate::Completed => {
                self.images = self.capture.take_images();
                self.capture.reset();
                self.view = ViewState::Customizing;
                info!(photos = self.images.len(), "Session complete");
                Effect::ReleaseCamera
            }
            SequenceUpdate::Aborted(err) => {
                self.capture.reset();
                self.view = ViewState::Start;
                self.notice = Some(Notice::error(format!(
                    "Failed to take a photo ({}). Press start to try again.",
                    err
                )));
                Effect::ReleaseCamera
            }
        }
    }

    fn handle_reset(&mut self) -> Effect {
        if self.is_downloading {
            return self.ignore("Reset");
        }
        let effect = match self.view {
            ViewState::Start => return self.ignore("Reset"),
            ViewState::Capturing => Effect::ReleaseCamera,
            ViewState::Customizing | ViewState::Result => Effect::None,
        };
        info!(from = ?self.view, "Resetting session");
        self.capture.reset();
        self.images.clear();
        self.style = FrameStyle::default();
        self.layout = Layout::default();
        self.custom_color = Rgb::WHITE;
        self.last_artifact = None;
        self.notice = None;
        self.view = ViewState::Start;
        effect
    }

    fn ignore(&self, action: &str) -> Effect {
        debug!(action, view = ?self.view, "Ignoring action");
        Effect::None
    }
}
