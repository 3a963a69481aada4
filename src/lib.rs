// SPDX-License-Identifier: GPL-3.0-only

//! Photobooth - four timed shots composed into a styled frame
//!
//! # Architecture
//!
//! - [`app`]: Application state, reducers and the host that performs effects
//! - [`backends`]: Camera sources (V4L2, still images, test pattern)
//! - [`sequence`]: Countdown and capture timing on a logical clock
//! - [`pipelines`]: Frame composition, rendering and PNG export
//! - [`delivery`]: Static server for the built web client
//! - [`terminal`]: Interactive terminal shell
//! - [`config`]: User configuration handling

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod delivery;
pub mod errors;
pub mod pipelines;
pub mod sequence;
pub mod terminal;

// Re-export commonly used types
pub use app::{Action, AppState, Photobooth, ViewState};
pub use config::Config;
pub use errors::{AppError, AppResult};
