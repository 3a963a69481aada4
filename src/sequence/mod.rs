// SPDX-License-Identifier: GPL-3.0-only

//! Capture-sequence control
//!
//! ```text
//! TimerQueue (logical clock) ──events──► CaptureController ──snapshot──► camera
//!        ▲                                      │
//!   driver / shell tick                   SequenceUpdate
//! ```

pub mod controller;
pub mod driver;
pub mod scheduler;

pub use controller::{
    CaptureController, CaptureSession, SequenceEvent, SequenceState, SequenceTiming,
    SequenceUpdate, SessionToken, StepPhase,
};
pub use driver::run_sequence;
pub use scheduler::TimerQueue;
