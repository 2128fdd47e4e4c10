// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Declarative element files
//!
//! An element is a base shape plus holes and raw operation records, read from
//! JSON. Problems with individual entries are logged and the entry is skipped.

use crate::config::PipelineConfig;
use crate::error::{CutError, Result};
use crate::geometry::BooleanOp;
use crate::ops::axis::Axis;
use crate::ops::builders::{CounterboreSpec, GridSpec, HoleBuilder, HoleSpec, StageSpec};
use crate::ops::operation::{Operation, Shape};
use anyhow::Context;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Base shape and its ordered operations, in the element's local frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementGeometry {
    pub base: Shape,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl ElementGeometry {
    pub fn new(base: Shape) -> Self {
        Self {
            base,
            operations: Vec::new(),
        }
    }

    pub fn with_operations(base: Shape, operations: Vec<Operation>) -> Self {
        Self { base, operations }
    }

    pub fn push(&mut self, op: Operation) {
        self.operations.push(op);
    }

    pub fn extend(&mut self, ops: impl IntoIterator<Item = Operation>) {
        self.operations.extend(ops);
    }
}

/// Loosely typed operation as it appears in element files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub kind: String,
    pub primitive: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default)]
    pub segments: u32,
    #[serde(default)]
    pub position: [f64; 3],
    #[serde(default)]
    pub rotation: [f64; 3],
    #[serde(default)]
    pub axial_offset: f64,
}

fn required(name: &'static str, value: Option<f64>) -> Result<f64> {
    value.ok_or_else(|| CutError::invalid(name, "missing"))
}

impl TryFrom<&OperationRecord> for Operation {
    type Error = CutError;

    fn try_from(record: &OperationRecord) -> Result<Self> {
        let kind: BooleanOp = record.kind.parse()?;
        let shape = match record.primitive.trim().to_ascii_lowercase().as_str() {
            "cylinder" => Shape::cylinder(
                required("radius", record.radius)?,
                required("height", record.height)?,
                record.segments,
            ),
            "box" | "cuboid" => Shape::cuboid(
                required("width", record.width)?,
                required("height", record.height)?,
                required("length", record.length)?,
            ),
            "sphere" => Shape::sphere(required("radius", record.radius)?, record.segments),
            other => return Err(CutError::UnknownPrimitive(other.to_string())),
        };
        shape.validate()?;

        Ok(Operation::new(kind, shape)
            .at(Vector3::from(record.position))
            .rotated(Vector3::from(record.rotation))
            .with_axial_offset(record.axial_offset))
    }
}

/// One counterbore stage in an element file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub radius: f64,
    pub depth: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
}

/// Hole helper invocation in an element file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HoleDefinition {
    Single {
        radius: f64,
        axis: Axis,
        #[serde(default)]
        direction: Option<String>,
        #[serde(default)]
        depth: Option<f64>,
        #[serde(default)]
        position: [f64; 3],
        #[serde(default)]
        segments: u32,
    },
    Grid {
        radius: f64,
        axis: Axis,
        #[serde(default)]
        direction: Option<String>,
        #[serde(default)]
        depth: Option<f64>,
        rows: usize,
        cols: usize,
        spacing: [f64; 2],
        #[serde(default)]
        margin: [f64; 2],
        #[serde(default)]
        skip: Vec<[usize; 2]>,
        /// Defaults to the base extents along the face axes
        #[serde(default)]
        face_extent: Option<[f64; 2]>,
        #[serde(default)]
        anchor: [f64; 3],
        #[serde(default)]
        segments: u32,
    },
    Counterbore {
        axis: Axis,
        #[serde(default)]
        direction: Option<String>,
        #[serde(default)]
        position: [f64; 3],
        #[serde(default)]
        profile: Option<String>,
        #[serde(default)]
        first: Option<StageDefinition>,
        #[serde(default)]
        second: Option<StageDefinition>,
        #[serde(default)]
        segments: u32,
    },
}

impl HoleDefinition {
    fn build(
        &self,
        base: &Shape,
        builder: &HoleBuilder,
        config: &PipelineConfig,
    ) -> Result<Vec<Operation>> {
        let resolver = builder.resolver();
        match self {
            HoleDefinition::Single {
                radius,
                axis,
                direction,
                depth,
                position,
                segments,
            } => {
                let spec = HoleSpec {
                    radius: *radius,
                    axis: *axis,
                    direction: Some(resolver.parse_direction(*axis, direction.as_deref())),
                    depth: *depth,
                    segments: *segments,
                };
                let op = builder.single_hole(&spec, Vector3::from(*position), base.extent(*axis))?;
                Ok(vec![op])
            }
            HoleDefinition::Grid {
                radius,
                axis,
                direction,
                depth,
                rows,
                cols,
                spacing,
                margin,
                skip,
                face_extent,
                anchor,
                segments,
            } => {
                let (u, v) = axis.face_axes();
                let grid = GridSpec {
                    hole: HoleSpec {
                        radius: *radius,
                        axis: *axis,
                        direction: Some(resolver.parse_direction(*axis, direction.as_deref())),
                        depth: *depth,
                        segments: *segments,
                    },
                    rows: *rows,
                    cols: *cols,
                    spacing: *spacing,
                    margin: *margin,
                    skip: skip.iter().map(|[row, col]| (*row, *col)).collect(),
                    face_extent: face_extent.unwrap_or([base.extent(u), base.extent(v)]),
                    anchor: Vector3::from(*anchor),
                };
                builder.hole_grid(&grid, base.extent(*axis))
            }
            HoleDefinition::Counterbore {
                axis,
                direction,
                position,
                profile,
                first,
                second,
                segments,
            } => {
                let stage_direction = |stage: &StageDefinition| {
                    let raw = stage.direction.as_deref().or(direction.as_deref());
                    resolver.parse_direction(*axis, raw)
                };
                let mut spec = match (first, second, profile) {
                    (Some(first), Some(second), _) => CounterboreSpec {
                        axis: *axis,
                        first: StageSpec {
                            radius: first.radius,
                            depth: first.depth,
                            direction: Some(stage_direction(first)),
                        },
                        second: StageSpec {
                            radius: second.radius,
                            depth: second.depth,
                            direction: Some(stage_direction(second)),
                        },
                        segments: 0,
                    },
                    (_, _, Some(name)) => {
                        let preset = config
                            .counterbore_profile(name)
                            .ok_or_else(|| CutError::UnknownProfile(name.clone()))?;
                        let direction = resolver.parse_direction(*axis, direction.as_deref());
                        CounterboreSpec::from_profile(preset, *axis, Some(direction))
                    }
                    _ => {
                        return Err(CutError::invalid(
                            "counterbore",
                            "needs both `first` and `second` stages or a `profile`",
                        ))
                    }
                };
                spec.segments = *segments;
                let ops = builder.counterbore_hole(&spec, Vector3::from(*position), base.extent(*axis))?;
                Ok(ops.to_vec())
            }
        }
    }
}

/// Element as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDefinition {
    pub id: String,
    pub base: Shape,
    #[serde(default)]
    pub holes: Vec<HoleDefinition>,
    #[serde(default)]
    pub operations: Vec<OperationRecord>,
}

/// Geometry built from a definition, plus whatever had to be skipped
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub geometry: ElementGeometry,
    pub skipped: Vec<CutError>,
}

impl ElementDefinition {
    /// Holes in declared order, followed by raw operations
    pub fn to_geometry(&self, builder: &HoleBuilder, config: &PipelineConfig) -> LoadReport {
        let mut geometry = ElementGeometry::new(self.base);
        let mut skipped = Vec::new();

        for (index, hole) in self.holes.iter().enumerate() {
            match hole.build(&self.base, builder, config) {
                Ok(ops) => geometry.extend(ops),
                Err(e) => {
                    warn!("Element `{}`: skipping hole {}: {}", self.id, index, e);
                    skipped.push(e);
                }
            }
        }

        for (index, record) in self.operations.iter().enumerate() {
            match Operation::try_from(record) {
                Ok(op) => geometry.push(op),
                Err(e) => {
                    warn!("Element `{}`: skipping operation {}: {}", self.id, index, e);
                    skipped.push(e);
                }
            }
        }

        LoadReport { geometry, skipped }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ElementFile {
    Many(Vec<ElementDefinition>),
    One(ElementDefinition),
}

/// Read a JSON file holding one element or an array of elements
pub fn load_elements(path: impl AsRef<Path>) -> anyhow::Result<Vec<ElementDefinition>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read element file: {:?}", path))?;
    let file: ElementFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse element file: {:?}", path))?;
    Ok(match file {
        ElementFile::Many(elements) => elements,
        ElementFile::One(element) => vec![element],
    })
}
