// SPDX-License-Identifier: GPL-3.0-only

//! Realtime driver for the capture sequence
//!
//! Sleeps on the tokio clock until the controller's next deadline, then
//! advances the logical clock by the same amount.

use super::controller::{CaptureController, SequenceUpdate};
use crate::backends::camera::SnapshotSource;
use crate::errors::AppResult;
use tracing::debug;

/// Run one full sequence in real time
///
/// `on_update` sees every update in order. Returns once the run completes,
/// or with the photo error that aborted it.
pub async fn run_sequence(
    controller: &mut CaptureController,
    camera: &mut dyn SnapshotSource,
    mut on_update: impl FnMut(&SequenceUpdate),
) -> AppResult<()> {
    controller.start()?;

    while let Some(wait) = controller.time_until_next() {
        tokio::time::sleep(wait).await;
        debug!(waited_ms = wait.as_millis() as u64, "Sequence timer fired");

        for update in controller.advance(wait, camera) {
            on_update(&update);
            match update {
                SequenceUpdate::Completed => return Ok(()),
                SequenceUpdate::Aborted(err) => return Err(err.into()),
                _ => {}
            }
        }
    }

    Ok(())
}
