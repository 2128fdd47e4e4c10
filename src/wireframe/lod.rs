// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

use crate::config::LodConfig;

/// Segment count for an outline seen from `distance`.
///
/// Halved beyond `mid_distance`, quartered beyond `far_distance`, floored at
/// `min_segments` but never raised above `segments`.
pub fn segments_for_distance(segments: u32, distance: Option<f64>, lod: &LodConfig) -> u32 {
    let reduced = match distance {
        Some(d) if d > lod.far_distance => segments / 4,
        Some(d) if d > lod.mid_distance => segments / 2,
        _ => segments,
    };
    reduced.max(lod.min_segments).min(segments)
}
