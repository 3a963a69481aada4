// SPDX-License-Identifier: GPL-3.0-only

//! Application state
//!
//! Everything the shell shows lives in [`AppState`]. It is changed only by
//! [`AppState::update`](super::update), which returns the side effect the
//! host has to perform.

use crate::constants::frame::DEFAULT_CAPTION;
use crate::errors::{CameraError, ExportError};
use crate::pipelines::frame::{FrameStyle, FrameTree, Layout, PresetId, Rgb, compose};
use crate::pipelines::photo::{CapturedImage, ImageArtifact};
use crate::sequence::{CaptureController, SequenceTiming, SequenceUpdate};

/// Which screen is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Start,
    Capturing,
    Customizing,
    Result,
}

impl ViewState {
    pub fn title(&self) -> &'static str {
        match self {
            ViewState::Start => "Photobooth",
            ViewState::Capturing => "Smile!",
            ViewState::Customizing => "Customize your frame",
            ViewState::Result => "Your photos",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// User-visible message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// User intents and completions fed into the reducer
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    StartSequence,
    CameraFailed(CameraError),
    Sequence(SequenceUpdate),
    SelectLayout(Layout),
    SelectPreset(PresetId),
    SetCustomColor(Rgb),
    Reorder { from: usize, to: usize },
    Confirm,
    Download,
    ExportFinished(Result<ImageArtifact, ExportError>),
    Reset,
    DismissNotice,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    AcquireCamera,
    ReleaseCamera,
    Export(FrameTree),
}

/// State of the photobooth
pub struct AppState {
    pub view: ViewState,
    pub capture: CaptureController,
    /// Photos of the finished session, in frame order
    pub images: Vec<CapturedImage>,
    pub style: FrameStyle,
    pub layout: Layout,
    /// Base color offered for a custom style
    pub custom_color: Rgb,
    pub caption: String,
    pub is_downloading: bool,
    pub notice: Option<Notice>,
    pub last_artifact: Option<ImageArtifact>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(SequenceTiming::default(), DEFAULT_CAPTION)
    }
}

impl AppState {
    pub fn new(timing: SequenceTiming, caption: impl Into<String>) -> Self {
        Self {
            view: ViewState::Start,
            capture: CaptureController::new(timing),
            images: Vec::new(),
            style: FrameStyle::default(),
            layout: Layout::default(),
            custom_color: Rgb::WHITE,
            caption: caption.into(),
            is_downloading: false,
            notice: None,
            last_artifact: None,
        }
    }

    /// Photos to show in the current view
    pub fn photos(&self) -> &[CapturedImage] {
        match self.view {
            ViewState::Capturing => &self.capture.session().images,
            _ => &self.images,
        }
    }

    /// Countdown overlay, while capturing
    pub fn countdown(&self) -> Option<u8> {
        match self.view {
            ViewState::Capturing => self.capture.session().countdown,
            _ => None,
        }
    }

    /// The frame as it would be exported now
    pub fn frame_tree(&self) -> FrameTree {
        compose(&self.images, &self.style, self.layout).with_caption(self.caption.clone())
    }
}
