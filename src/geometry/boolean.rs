// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boolean operation kinds and the pluggable CSG backend

use super::csg::{csg_difference, csg_intersection, csg_union};
use super::Mesh;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Boolean effect of an operation on the running result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BooleanOp {
    Subtract,
    Union,
    Intersect,
}

impl BooleanOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BooleanOp::Subtract => "subtract",
            BooleanOp::Union => "union",
            BooleanOp::Intersect => "intersect",
        }
    }
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BooleanOp {
    type Err = crate::error::CutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "subtract" | "difference" => Ok(BooleanOp::Subtract),
            "union" | "add" => Ok(BooleanOp::Union),
            "intersect" | "intersection" => Ok(BooleanOp::Intersect),
            other => Err(crate::error::CutError::UnknownKind(other.to_string())),
        }
    }
}

/// Perform boolean operation between two meshes with the BSP backend
pub fn perform_boolean_operation(mesh_a: &Mesh, mesh_b: &Mesh, op: BooleanOp) -> Result<Mesh> {
    match op {
        BooleanOp::Union => csg_union(mesh_a, mesh_b),
        BooleanOp::Subtract => csg_difference(mesh_a, mesh_b),
        BooleanOp::Intersect => csg_intersection(mesh_a, mesh_b),
    }
}

/// Geometry engine used by the evaluator and batcher.
///
/// `merge` combines tool shapes without a boolean step; the default simply
/// concatenates them.
pub trait CsgBackend {
    fn apply(&self, target: &Mesh, tool: &Mesh, op: BooleanOp) -> Result<Mesh>;

    fn merge(&self, parts: &[Mesh]) -> Result<Mesh> {
        let mut merged = Mesh::with_capacity(
            parts.iter().map(Mesh::vertex_count).sum(),
            parts.iter().map(Mesh::triangle_count).sum(),
        );
        for part in parts {
            merged.merge(part);
        }
        Ok(merged)
    }
}

/// In-process BSP tree backend
#[derive(Debug, Clone, Copy, Default)]
pub struct BspBackend;

impl CsgBackend for BspBackend {
    fn apply(&self, target: &Mesh, tool: &Mesh, op: BooleanOp) -> Result<Mesh> {
        perform_boolean_operation(target, tool, op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;

    #[test]
    fn test_parse_kinds() {
        assert_eq!("subtract".parse::<BooleanOp>().unwrap(), BooleanOp::Subtract);
        assert_eq!(" Union ".parse::<BooleanOp>().unwrap(), BooleanOp::Union);
        assert!("extrude".parse::<BooleanOp>().is_err());
    }

    #[test]
    fn test_default_merge_concatenates() {
        let part = Primitive::cuboid(1.0, 1.0, 1.0).to_mesh();
        let merged = BspBackend.merge(&[part.clone(), part.clone()]).unwrap();
        assert_eq!(merged.triangle_count(), part.triangle_count() * 2);
    }

    #[test]
    fn test_union() {
        let mesh_a = Primitive::cuboid(10.0, 10.0, 10.0).to_mesh();
        let mesh_b = Primitive::sphere(5.0, 16).to_mesh();

        let result = BspBackend.apply(&mesh_a, &mesh_b, BooleanOp::Union);
        assert!(result.is_ok());
    }
}
