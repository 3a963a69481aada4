// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use photobooth::constants::{SLOT_COUNT, file_formats, frame, sequence, server};
use std::time::Duration;

#[test]
fn test_slot_count() {
    assert_eq!(SLOT_COUNT, 4);
}

#[test]
fn test_lead_in_ordering() {
    // The first shot starts sooner than the ones that follow
    assert!(sequence::FIRST_LEAD_IN < sequence::LEAD_IN);
    assert_eq!(sequence::COUNTDOWN_FROM, 3);
}

#[test]
fn test_full_sequence_duration() {
    let step = sequence::COUNTDOWN_TICK * sequence::COUNTDOWN_FROM as u32 + sequence::SETTLE_DELAY;
    let total = sequence::FIRST_LEAD_IN + sequence::LEAD_IN * 3 + step * SLOT_COUNT as u32;
    assert_eq!(total, Duration::from_millis(500 + 4500 + 4 * 3200));
}

#[test]
fn test_frame_widths() {
    assert!(frame::GRID_WIDTH > frame::STRIP_WIDTH);
}

#[test]
fn test_image_extensions() {
    assert!(file_formats::is_image_extension("PNG"));
    assert!(file_formats::is_image_extension("jpeg"));
    assert!(!file_formats::is_image_extension("txt"));
}

#[test]
fn test_server_defaults() {
    assert_eq!(server::DEFAULT_PORT, 3001);
    assert_eq!(server::PORT_ENV, "PORT");
    assert_eq!(server::ENTRY_DOCUMENT, "index.html");
}
