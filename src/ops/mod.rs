// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Operation descriptors and the helpers that produce them

pub mod axis;
mod builders;
mod element;
mod key;
mod operation;

pub use axis::{Axis, Direction, DirectionResolver, HoleOrientation};
pub use builders::{CounterboreSpec, GridSpec, HoleBuilder, HoleSpec, StageSpec};
pub use element::{
    load_elements, ElementDefinition, ElementGeometry, HoleDefinition, LoadReport, OperationRecord,
    StageDefinition,
};
pub use key::{CacheKey, Canonicalizer, GroupKey, OpKey, ShapeKey, POSITION_PRECISION};
pub use operation::{CombinedOp, Operation, PlannedOp, Shape};
