// SPDX-License-Identifier: GPL-3.0-only

//! Timed four-shot capture sequence
//!
//! # State machine
//!
//! ```text
//! Idle ──start──► Running{step 1..=4} ──4th snapshot──► Complete
//!   ▲                   │
//!   └──cancel / failed snapshot
//! ```
//!
//! Each step runs `lead-in → 3 → 2 → 1 → (clear) → settle → snapshot`. The
//! first lead-in is short; later ones leave time to see the shot was taken.
//!
//! Every scheduled event carries the [`SessionToken`] that was current when
//! it was scheduled. `start` and `cancel` issue a new token, so an event
//! belonging to an abandoned run is dropped before it can touch the session.

use super::scheduler::TimerQueue;
use crate::backends::camera::SnapshotSource;
use crate::constants::{SLOT_COUNT, sequence};
use crate::errors::{PhotoError, SequenceError};
use crate::pipelines::photo::CapturedImage;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Identity of one run of the sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(u64);

impl SessionToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// What a scheduled event does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
    /// Show this countdown number
    Countdown(u8),
    /// Clear the countdown and wait for the overlay to disappear
    Settle,
    /// Take the photo
    Snapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceEvent {
    pub token: SessionToken,
    /// 1-based step number
    pub step: usize,
    pub phase: StepPhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequenceState {
    #[default]
    Idle,
    Running {
        step: usize,
    },
    Complete,
}

impl SequenceState {
    pub fn is_running(&self) -> bool {
        matches!(self, SequenceState::Running { .. })
    }
}

/// Observable change reported to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceUpdate {
    /// Countdown overlay changed (`None` clears it)
    Countdown(Option<u8>),
    /// A photo was appended
    Captured { step: usize, progress: usize },
    /// All four photos are in
    Completed,
    /// The run was abandoned after a failed snapshot
    Aborted(PhotoError),
}

/// Delays used by the sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceTiming {
    pub first_lead_in: Duration,
    pub lead_in: Duration,
    pub tick: Duration,
    pub settle: Duration,
    pub countdown_from: u8,
}

impl Default for SequenceTiming {
    fn default() -> Self {
        Self {
            first_lead_in: sequence::FIRST_LEAD_IN,
            lead_in: sequence::LEAD_IN,
            tick: sequence::COUNTDOWN_TICK,
            settle: sequence::SETTLE_DELAY,
            countdown_from: sequence::COUNTDOWN_FROM,
        }
    }
}

impl SequenceTiming {
    /// Every delay divided by `divisor` (for demos and realtime tests)
    pub fn scaled(self, divisor: u32) -> Self {
        let divisor = divisor.max(1);
        Self {
            first_lead_in: self.first_lead_in / divisor,
            lead_in: self.lead_in / divisor,
            tick: self.tick / divisor,
            settle: self.settle / divisor,
            countdown_from: self.countdown_from,
        }
    }

    /// Logical time from `start` to the last snapshot of a full run
    pub fn total(&self) -> Duration {
        let step = self.tick * u32::from(self.countdown_from) + self.settle;
        let steps = SLOT_COUNT as u32;
        self.first_lead_in + self.lead_in * (steps - 1) + step * steps
    }
}

/// Photos and countdown of the current run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureSession {
    pub images: Vec<CapturedImage>,
    pub countdown: Option<u8>,
}

impl CaptureSession {
    /// Number of photos taken; always equals `images.len()`
    pub fn progress(&self) -> usize {
        self.images.len()
    }
}

/// Drives the capture sequence on a [`TimerQueue`]
pub struct CaptureController {
    timing: SequenceTiming,
    queue: TimerQueue<SequenceEvent>,
    state: SequenceState,
    session: CaptureSession,
    token: SessionToken,
}

impl Default for CaptureController {
    fn default() -> Self {
        Self::new(SequenceTiming::default())
    }
}

impl CaptureController {
    pub fn new(timing: SequenceTiming) -> Self {
        Self {
            timing,
            queue: TimerQueue::new(),
            state: SequenceState::Idle,
            session: CaptureSession::default(),
            token: SessionToken(0),
        }
    }

    pub fn timing(&self) -> &SequenceTiming {
        &self.timing
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    /// Logical time of the controller's clock
    pub fn now(&self) -> Duration {
        self.queue.now()
    }

    /// Logical due time of the next pending event
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.next_deadline()
    }

    /// Time left until the next pending event
    pub fn time_until_next(&self) -> Option<Duration> {
        self.queue.time_until_next()
    }

    fn issue_token(&mut self) -> SessionToken {
        self.token = SessionToken(self.token.0 + 1);
        self.token
    }

    fn schedule(&mut self, delay: Duration, step: usize, phase: StepPhase) {
        let event = SequenceEvent {
            token: self.token,
            step,
            phase,
        };
        self.queue.schedule_after(delay, event);
    }

    /// Begin a new run with an empty session
    pub fn start(&mut self) -> Result<SessionToken, SequenceError> {
        if self.state.is_running() {
            return Err(SequenceError::AlreadyRunning);
        }
        let token = self.issue_token();
        self.queue.clear();
        self.session = CaptureSession::default();
        self.state = SequenceState::Running { step: 1 };
        self.schedule(
            self.timing.first_lead_in,
            1,
            StepPhase::Countdown(self.timing.countdown_from),
        );
        info!(token = token.0, "Capture sequence started");
        Ok(token)
    }

    /// Abandon the current run
    ///
    /// Pending events are dropped and the token is invalidated; photos taken
    /// by completed steps stay in the session until `reset`.
    pub fn cancel(&mut self) {
        let was_running = self.state.is_running();
        self.issue_token();
        self.queue.clear();
        self.session.countdown = None;
        if was_running {
            self.state = SequenceState::Idle;
            info!(progress = self.session.progress(), "Capture sequence cancelled");
        }
    }

    /// Cancel and forget all photos
    pub fn reset(&mut self) {
        self.cancel();
        self.session = CaptureSession::default();
        self.state = SequenceState::Idle;
    }

    /// Move the photos out of the session
    pub fn take_images(&mut self) -> Vec<CapturedImage> {
        std::mem::take(&mut self.session.images)
    }

    /// Advance the clock by `elapsed`, firing every event that becomes due
    ///
    /// Events scheduled by a firing event are measured from its due time, so
    /// one large step yields the same sequence as many small ones.
    pub fn advance(
        &mut self,
        elapsed: Duration,
        camera: &mut dyn SnapshotSource,
    ) -> Vec<SequenceUpdate> {
        let target = self.queue.now() + elapsed;
        let mut updates = Vec::new();

        while let Some(event) = self.queue.pop_due(target) {
            let was_running = self.state.is_running();
            if let Some(update) = self.handle(event, camera) {
                updates.push(update);
            }
            if was_running && self.state == SequenceState::Complete {
                updates.push(SequenceUpdate::Completed);
            }
        }

        self.queue.advance_to(target);
        updates
    }

    /// Apply one fired event
    ///
    /// Events from another session are ignored. The final snapshot moves the
    /// controller to `Complete`; `advance` reports that as
    /// [`SequenceUpdate::Completed`].
    pub fn handle(
        &mut self,
        event: SequenceEvent,
        camera: &mut dyn SnapshotSource,
    ) -> Option<SequenceUpdate> {
        if event.token != self.token {
            debug!(
                event_token = event.token.0,
                current = self.token.0,
                "Ignoring stale sequence event"
            );
            return None;
        }
        let SequenceState::Running { step } = self.state else {
            debug!(state = ?self.state, "Ignoring sequence event while not running");
            return None;
        };
        if step != event.step {
            debug!(step, event_step = event.step, "Ignoring event for another step");
            return None;
        }

        match event.phase {
            StepPhase::Countdown(n) => {
                self.session.countdown = Some(n);
                debug!(step, countdown = n, "Countdown");
                if n > 1 {
                    self.schedule(self.timing.tick, step, StepPhase::Countdown(n - 1));
                } else {
                    self.schedule(self.timing.tick, step, StepPhase::Settle);
                }
                Some(SequenceUpdate::Countdown(Some(n)))
            }
            StepPhase::Settle => {
                self.session.countdown = None;
                self.schedule(self.timing.settle, step, StepPhase::Snapshot);
                Some(SequenceUpdate::Countdown(None))
            }
            StepPhase::Snapshot => Some(self.take_snapshot(step, camera)),
        }
    }

    fn take_snapshot(&mut self, step: usize, camera: &mut dyn SnapshotSource) -> SequenceUpdate {
        let Some(image) = camera.snapshot() else {
            warn!(step, progress = self.session.progress(), "Snapshot failed, aborting sequence");
            self.issue_token();
            self.queue.clear();
            self.session.countdown = None;
            self.state = SequenceState::Idle;
            return SequenceUpdate::Aborted(PhotoError::SnapshotNotReady);
        };

        self.session.images.push(image);
        let progress = self.session.progress();
        info!(step, progress, "Photo captured");

        if progress < SLOT_COUNT {
            let next = step + 1;
            self.state = SequenceState::Running { step: next };
            self.schedule(
                self.timing.lead_in,
                next,
                StepPhase::Countdown(self.timing.countdown_from),
            );
        } else {
            self.state = SequenceState::Complete;
            info!("Capture sequence complete");
        }
        SequenceUpdate::Captured { step, progress }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn photo() -> Option<CapturedImage> {
        CapturedImage::from_pixels(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]))).ok()
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_first_step_timeline() {
        let mut ctl = CaptureController::default();
        let mut cam = photo;
        ctl.start().unwrap();

        assert!(ctl.advance(ms(499), &mut cam).is_empty());
        assert_eq!(ctl.advance(ms(1), &mut cam), vec![SequenceUpdate::Countdown(Some(3))]);
        assert_eq!(ctl.advance(ms(1000), &mut cam), vec![SequenceUpdate::Countdown(Some(2))]);
        assert_eq!(ctl.advance(ms(1000), &mut cam), vec![SequenceUpdate::Countdown(Some(1))]);
        assert_eq!(ctl.advance(ms(1000), &mut cam), vec![SequenceUpdate::Countdown(None)]);
        assert!(ctl.advance(ms(199), &mut cam).is_empty());
        assert_eq!(
            ctl.advance(ms(1), &mut cam),
            vec![SequenceUpdate::Captured { step: 1, progress: 1 }]
        );
        assert_eq!(ctl.state(), SequenceState::Running { step: 2 });
        // Later steps use the longer lead-in
        assert_eq!(ctl.time_until_next(), Some(ms(1500)));
    }

    #[test]
    fn test_countdown_only_set_while_counting() {
        let mut ctl = CaptureController::default();
        let mut cam = photo;
        ctl.start().unwrap();
        assert_eq!(ctl.session().countdown, None);
        ctl.advance(ms(500), &mut cam);
        assert_eq!(ctl.session().countdown, Some(3));
        ctl.advance(ms(3000), &mut cam);
        assert_eq!(ctl.session().countdown, None);
    }

    #[test]
    fn test_full_run_in_one_advance() {
        let mut ctl = CaptureController::default();
        let mut cam = photo;
        ctl.start().unwrap();

        let updates = ctl.advance(ctl.timing().total(), &mut cam);

        assert_eq!(updates.last(), Some(&SequenceUpdate::Completed));
        assert_eq!(ctl.state(), SequenceState::Complete);
        assert_eq!(ctl.session().progress(), SLOT_COUNT);
        assert!(ctl.next_deadline().is_none());
    }

    #[test]
    fn test_start_while_running_is_refused() {
        let mut ctl = CaptureController::default();
        ctl.start().unwrap();
        assert_eq!(ctl.start(), Err(SequenceError::AlreadyRunning));
    }

    #[test]
    fn test_stale_event_is_ignored() {
        let mut ctl = CaptureController::default();
        let mut cam = photo;
        let old = ctl.start().unwrap();
        ctl.cancel();
        ctl.start().unwrap();

        let stale = SequenceEvent {
            token: old,
            step: 1,
            phase: StepPhase::Snapshot,
        };
        assert_eq!(ctl.handle(stale, &mut cam), None);
        assert_eq!(ctl.session().progress(), 0);
    }

    #[test]
    fn test_scaled_timing() {
        let timing = SequenceTiming::default().scaled(100);
        assert_eq!(timing.tick, ms(10));
        assert_eq!(timing.first_lead_in, ms(5));
        assert_eq!(SequenceTiming::default().total(), ms(500 + 3 * 1500 + 4 * 3200));
    }
}
