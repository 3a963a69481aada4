// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the photobooth
//!
//! Camera and export failures are caught at the component boundary and turned
//! into user-visible notices; nothing here is retried automatically.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),
    #[error("Photo error: {0}")]
    Photo(#[from] PhotoError),
    #[error("Sequence error: {0}")]
    Sequence(#[from] SequenceError),
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

/// Camera acquisition errors
///
/// Permission refusal, missing hardware and everything else are kept apart so
/// the user gets a message they can act on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("Camera access was not allowed: {0}")]
    PermissionDenied(String),
    #[error("No camera was found: {0}")]
    DeviceNotFound(String),
    #[error("Camera error: {0}")]
    DeviceError(String),
}

impl CameraError {
    /// Classify an OS error raised while opening or streaming a device
    pub fn from_io(context: &str, err: &std::io::Error) -> Self {
        let detail = format!("{}: {}", context, err);
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => CameraError::PermissionDenied(detail),
            std::io::ErrorKind::NotFound => CameraError::DeviceNotFound(detail),
            _ => CameraError::DeviceError(detail),
        }
    }

    /// Short text shown in the start view after a failed session start
    pub fn user_message(&self) -> String {
        match self {
            CameraError::PermissionDenied(_) => {
                "Camera access was not allowed. Grant access to the video device and try again."
                    .to_string()
            }
            CameraError::DeviceNotFound(_) => "No camera was found.".to_string(),
            CameraError::DeviceError(msg) => format!("Camera error: {}.", msg),
        }
    }
}

/// Photo capture errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhotoError {
    /// The stream has not delivered a frame yet
    #[error("Camera is not ready for a snapshot")]
    SnapshotNotReady,
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}

/// Capture-sequence control errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("A capture sequence is already running")]
    AlreadyRunning,
}

/// Frame export errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("An export is already in progress")]
    AlreadyInProgress,
    #[error("Failed to render the frame: {0}")]
    RenderFailure(String),
}

/// Static delivery errors
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The bundle's entry document is missing (client-side problem: build not run)
    #[error("Entry document not found: {}", .0.display())]
    StaticAssetMissing(PathBuf),
    #[error("Failed to bind {0}")]
    Bind(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeliveryError {
    /// HTTP status used when this error ends a request
    pub fn status_code(&self) -> u16 {
        match self {
            DeliveryError::StaticAssetMissing(_) => 404,
            DeliveryError::Bind(_) | DeliveryError::Io(_) => 500,
        }
    }
}

/// Errors from parsing user-supplied values (CLI flags, config, shell input)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid hex color: {0:?}")]
    Color(String),
    #[error("unknown layout {0:?} (expected 2x2 or 1x4)")]
    Layout(String),
    #[error("unknown preset {name:?} (expected one of {expected})")]
    Preset { name: String, expected: String },
    #[error("invalid camera spec: {0}")]
    CameraSpec(String),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_error_classification() {
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
        let busy = std::io::Error::other("device busy");

        assert!(matches!(
            CameraError::from_io("/dev/video0", &denied),
            CameraError::PermissionDenied(_)
        ));
        assert!(matches!(
            CameraError::from_io("/dev/video0", &missing),
            CameraError::DeviceNotFound(_)
        ));
        assert!(matches!(
            CameraError::from_io("/dev/video0", &busy),
            CameraError::DeviceError(_)
        ));
    }

    #[test]
    fn test_delivery_status_codes() {
        let missing = DeliveryError::StaticAssetMissing(PathBuf::from("dist/index.html"));
        assert_eq!(missing.status_code(), 404);
        let io = DeliveryError::Io(std::io::Error::other("disk"));
        assert_eq!(io.status_code(), 500);
    }

    #[test]
    fn test_parse_error_messages() {
        assert_eq!(
            ParseError::Color("#12".to_string()).to_string(),
            r##"invalid hex color: "#12""##
        );
        assert_eq!(
            ParseError::Layout("3x3".to_string()).to_string(),
            r#"unknown layout "3x3" (expected 2x2 or 1x4)"#
        );
    }

    #[test]
    fn test_app_error_wraps_sub_errors() {
        let err: AppError = PhotoError::SnapshotNotReady.into();
        assert!(err.to_string().starts_with("Photo error"));
    }
}
