// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - mesh representation and operations

mod bbox;
mod boolean;
pub mod csg;
mod mesh;
pub mod mesh_utils;
mod primitives;

pub use bbox::{BoundingBox, BoundingSphere};
pub use boolean::{perform_boolean_operation, BooleanOp, BspBackend, CsgBackend};
pub use mesh::{BoundingVolumes, Mesh, SimplifyReport, Triangle, Vertex};
pub use primitives::{Primitive, DEFAULT_SEGMENTS};
