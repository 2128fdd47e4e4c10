// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cutwork hole/cut kernel
//!
//! Turns declarative hole and cut operations on a base solid into one optimized
//! mesh, and reconstructs matching schematic outlines for blueprint rendering
//! without running any boolean operation.

pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod kernel;
pub mod ops;
pub mod pipeline;
pub mod profiler;
pub mod utils;
pub mod wireframe;

pub use config::PipelineConfig;
pub use error::{CutError, Result};
pub use geometry::{BooleanOp, BspBackend, CsgBackend, Mesh, Primitive};
pub use kernel::{BuildOutcome, BuildStatus, Kernel};
pub use ops::{
    Axis, Direction, DirectionResolver, ElementDefinition, ElementGeometry, HoleBuilder, Operation,
    PlannedOp, Shape,
};
pub use pipeline::{Batcher, BooleanEvaluator, Evaluation, ResultCache};
pub use profiler::DebugInfo;
pub use wireframe::{OutlineLoop, WireframeReconstructor};
