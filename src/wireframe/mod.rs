// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Blueprint-mode outlines reconstructed from operation descriptors

mod lod;
mod outline;

pub use lod::segments_for_distance;
pub use outline::{derive_axis, OutlineLoop, Rim, WireframeReconstructor, AXIS_TOLERANCE};
