// SPDX-License-Identifier: GPL-3.0-only

//! Image pipelines: photo capture/export and frame composition

pub mod frame;
pub mod photo;
