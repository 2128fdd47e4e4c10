// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Shared numeric helpers

pub mod math;

pub use math::{euler_xyz_to_rotation, placement_matrix, quantize, rotation_to_euler_xyz};
