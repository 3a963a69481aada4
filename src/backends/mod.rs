// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera capture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │     Shell / capture controller       │
//! └──────────────────┬───────────────────┘
//!                    │
//! ┌──────────────────┴───────────────────┐
//! │            Camera backend            │
//! │  ┌──────────────┐  ┌──────────────┐  │
//! │  │    V4L2      │  │ Still images │  │
//! │  │  (Linux)     │  │ test pattern │  │
//! │  └──────────────┘  └──────────────┘  │
//! └──────────────────────────────────────┘
//! ```
//!
//! - [`camera`]: device enumeration, scoped stream ownership and frame capture

pub mod camera;
