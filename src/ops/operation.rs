// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Operation descriptors

use crate::error::{ensure_positive, Result};
use crate::geometry::{BooleanOp, Mesh, Primitive};
use crate::ops::axis::Axis;
use crate::utils::placement_matrix;
use nalgebra::{Matrix4, Point3, Translation3, Vector3};
use serde::{Deserialize, Serialize};

/// Tool or base shape, built centered on the origin.
///
/// `height` is always the extent along local +Y; for holes that is the cut depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "primitive", rename_all = "lowercase")]
pub enum Shape {
    Cylinder {
        radius: f64,
        height: f64,
        #[serde(default)]
        segments: u32,
    },
    Box {
        width: f64,
        height: f64,
        length: f64,
    },
    Sphere {
        radius: f64,
        #[serde(default)]
        segments: u32,
    },
}

impl Shape {
    pub fn cylinder(radius: f64, height: f64, segments: u32) -> Self {
        Shape::Cylinder {
            radius,
            height,
            segments,
        }
    }

    pub fn cuboid(width: f64, height: f64, length: f64) -> Self {
        Shape::Box {
            width,
            height,
            length,
        }
    }

    pub fn sphere(radius: f64, segments: u32) -> Self {
        Shape::Sphere { radius, segments }
    }

    /// Segment count with zero replaced by `default_segments`
    pub fn segments_or(&self, default_segments: u32) -> u32 {
        match *self {
            Shape::Cylinder { segments, .. } | Shape::Sphere { segments, .. } => {
                if segments == 0 {
                    default_segments
                } else {
                    segments
                }
            }
            Shape::Box { .. } => 4,
        }
    }

    /// Extent along local +Y
    pub fn depth(&self) -> f64 {
        match *self {
            Shape::Cylinder { height, .. } | Shape::Box { height, .. } => height,
            Shape::Sphere { radius, .. } => radius * 2.0,
        }
    }

    /// Unrotated extent along a frame axis; used as parent thickness for holes
    pub fn extent(&self, axis: Axis) -> f64 {
        match (*self, axis) {
            (Shape::Box { width, .. }, Axis::X) => width,
            (Shape::Box { height, .. }, Axis::Y) => height,
            (Shape::Box { length, .. }, Axis::Z) => length,
            (Shape::Cylinder { height, .. }, Axis::Y) => height,
            (Shape::Cylinder { radius, .. }, _) => radius * 2.0,
            (Shape::Sphere { radius, .. }, _) => radius * 2.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            Shape::Cylinder { radius, height, .. } => {
                ensure_positive("radius", radius)?;
                ensure_positive("height", height)?;
            }
            Shape::Box {
                width,
                height,
                length,
            } => {
                ensure_positive("width", width)?;
                ensure_positive("height", height)?;
                ensure_positive("length", length)?;
            }
            Shape::Sphere { radius, .. } => {
                ensure_positive("radius", radius)?;
            }
        }
        Ok(())
    }

    pub fn to_primitive(&self, default_segments: u32) -> Primitive {
        let segments = self.segments_or(default_segments);
        match *self {
            Shape::Cylinder { radius, height, .. } => Primitive::cylinder(radius, height, segments),
            Shape::Box {
                width,
                height,
                length,
            } => Primitive::cuboid(width, height, length),
            Shape::Sphere { radius, .. } => Primitive::sphere(radius, segments),
        }
    }

    pub fn to_mesh(&self, default_segments: u32) -> Mesh {
        self.to_primitive(default_segments).to_mesh()
    }
}

/// One declarative boolean modification of a base solid.
///
/// The tool shape is placed by `T(position) * R(rotation) * T(0, axial_offset, 0)`:
/// `axial_offset` slides the tool along its own travel axis, so flipping the
/// rotation never moves the anchor `position`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub kind: BooleanOp,
    pub shape: Shape,
    pub position: Vector3<f64>,
    #[serde(default = "Vector3::zeros")]
    pub rotation: Vector3<f64>,
    #[serde(default)]
    pub axial_offset: f64,
}

impl Operation {
    pub fn new(kind: BooleanOp, shape: Shape) -> Self {
        Self {
            kind,
            shape,
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
            axial_offset: 0.0,
        }
    }

    pub fn subtract(shape: Shape) -> Self {
        Self::new(BooleanOp::Subtract, shape)
    }

    pub fn at(mut self, position: Vector3<f64>) -> Self {
        self.position = position;
        self
    }

    pub fn rotated(mut self, rotation: Vector3<f64>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_axial_offset(mut self, offset: f64) -> Self {
        self.axial_offset = offset;
        self
    }

    /// Full placement of the tool in the element's local frame
    pub fn placement_matrix(&self) -> Matrix4<f64> {
        placement_matrix(&self.position, &self.rotation)
            * Translation3::new(0.0, self.axial_offset, 0.0).to_homogeneous()
    }

    /// Centre of the placed tool
    pub fn center(&self) -> Point3<f64> {
        self.placement_matrix().transform_point(&Point3::origin())
    }

    /// Tool mesh placed in the element's local frame
    pub fn to_mesh(&self, default_segments: u32) -> Mesh {
        let mut mesh = self.shape.to_mesh(default_segments);
        mesh.transform(&self.placement_matrix());
        mesh
    }
}

/// Several congruent operations merged into one tool.
///
/// `mesh` is expressed in the anchor frame; `position`/`rotation` are the first
/// member's and are applied once when the tool is placed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedOp {
    pub kind: BooleanOp,
    pub mesh: Mesh,
    pub position: Vector3<f64>,
    pub rotation: Vector3<f64>,
    pub member_count: usize,
}

impl CombinedOp {
    pub fn placement_matrix(&self) -> Matrix4<f64> {
        placement_matrix(&self.position, &self.rotation)
    }
}

/// Output of the batcher: what the evaluator actually runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlannedOp {
    Single(Operation),
    Combined(CombinedOp),
}

impl PlannedOp {
    pub fn kind(&self) -> BooleanOp {
        match self {
            PlannedOp::Single(op) => op.kind,
            PlannedOp::Combined(combined) => combined.kind,
        }
    }

    /// Whether the tool was merged ahead of evaluation
    pub fn is_precombined(&self) -> bool {
        matches!(self, PlannedOp::Combined(_))
    }

    pub fn member_count(&self) -> usize {
        match self {
            PlannedOp::Single(_) => 1,
            PlannedOp::Combined(combined) => combined.member_count,
        }
    }

    /// Tool mesh in the element's local frame
    pub fn tool_mesh(&self, default_segments: u32) -> Mesh {
        match self {
            PlannedOp::Single(op) => op.to_mesh(default_segments),
            PlannedOp::Combined(combined) => combined.mesh.transformed(&combined.placement_matrix()),
        }
    }
}
