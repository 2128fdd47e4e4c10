// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Schematic outlines of operations
//!
//! Loops are built in the XY plane and placed by composing the construction-plane
//! correction, the operation's rotation and an optional context rotation. The
//! hole axis is re-derived from the combined rotation and must agree with the
//! axis the evaluator cuts along.

use super::lod::segments_for_distance;
use crate::config::{LodConfig, PipelineConfig};
use crate::geometry::{BooleanOp, DEFAULT_SEGMENTS};
use crate::ops::{Axis, Direction, ElementGeometry, Operation, Shape};
use crate::utils::{euler_xyz_to_rotation, rotation_to_euler_xyz};
use nalgebra::{Point2, Point3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;

/// Angle tolerance for axis derivation, radians
pub const AXIS_TOLERANCE: f64 = 0.01;

/// Which loop of an outline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rim {
    /// Entry rim
    Top,
    Bottom,
    Equator,
}

impl Rim {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rim::Top => "top",
            Rim::Bottom => "bottom",
            Rim::Equator => "equator",
        }
    }
}

impl fmt::Display for Rim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed loop in the XY construction plane plus its placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineLoop {
    pub key: String,
    pub rim: Rim,
    pub axis: Axis,
    pub direction: Direction,
    pub points: Vec<Point2<f64>>,
    pub position: Vector3<f64>,
    /// XYZ Euler angles
    pub rotation: Vector3<f64>,
}

impl OutlineLoop {
    /// Loop points with the placement applied
    pub fn world_points(&self) -> Vec<Point3<f64>> {
        let rotation = euler_xyz_to_rotation(&self.rotation);
        self.points
            .iter()
            .map(|p| Point3::from(rotation * Vector3::new(p.x, p.y, 0.0) + self.position))
            .collect()
    }
}

/// Hole axis and travel direction implied by XYZ Euler angles.
///
/// `|z| ≈ π/2` selects x (negative z travels right), otherwise `|x| ≈ π/2`
/// selects z (positive x travels forward), otherwise y (`x ≈ ±π` travels down).
pub fn derive_axis(rotation: &Vector3<f64>) -> (Axis, Direction) {
    let near = |value: f64, target: f64| (value - target).abs() < AXIS_TOLERANCE;

    if near(rotation.z.abs(), FRAC_PI_2) {
        if rotation.z < 0.0 {
            (Axis::X, Direction::Right)
        } else {
            (Axis::X, Direction::Left)
        }
    } else if near(rotation.x.abs(), FRAC_PI_2) {
        if rotation.x > 0.0 {
            (Axis::Z, Direction::Forward)
        } else {
            (Axis::Z, Direction::Backward)
        }
    } else if near(rotation.x.abs(), PI) {
        (Axis::Y, Direction::Down)
    } else {
        (Axis::Y, Direction::Up)
    }
}

fn circle(radius: f64, segments: u32) -> Vec<Point2<f64>> {
    (0..segments)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / segments as f64;
            Point2::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

fn rectangle(width: f64, length: f64) -> Vec<Point2<f64>> {
    let (hw, hl) = (width / 2.0, length / 2.0);
    vec![
        Point2::new(-hw, -hl),
        Point2::new(hw, -hl),
        Point2::new(hw, hl),
        Point2::new(-hw, hl),
    ]
}

/// Builds outline loops without running any boolean operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WireframeReconstructor {
    pub default_segments: u32,
    pub lod: LodConfig,
}

impl Default for WireframeReconstructor {
    fn default() -> Self {
        Self {
            default_segments: DEFAULT_SEGMENTS,
            lod: LodConfig::default(),
        }
    }
}

impl WireframeReconstructor {
    pub fn new(default_segments: u32, lod: LodConfig) -> Self {
        Self {
            default_segments,
            lod,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.default_segments, config.lod)
    }

    /// Outline loops for one operation at full detail
    pub fn reconstruct(&self, op: &Operation, context: Option<&Vector3<f64>>) -> Vec<OutlineLoop> {
        self.reconstruct_lod(op, context, None, "")
    }

    /// Outline loops with segment reduction for `distance`; keys are prefixed with `key_prefix`
    pub fn reconstruct_lod(
        &self,
        op: &Operation,
        context: Option<&Vector3<f64>>,
        distance: Option<f64>,
        key_prefix: &str,
    ) -> Vec<OutlineLoop> {
        let context = context.map_or_else(Rotation3::identity, euler_xyz_to_rotation);
        let oriented = context * euler_xyz_to_rotation(&op.rotation);
        let (axis, direction) = derive_axis(&rotation_to_euler_xyz(&oriented));

        // Loops are drawn in XY; the correction lays them across local +Y
        let correction = Rotation3::from_axis_angle(&Vector3::x_axis(), -FRAC_PI_2);
        let rotation = rotation_to_euler_xyz(&(oriented * correction));

        let center = context * op.center().coords;
        let travel = direction.vector();
        let segments = segments_for_distance(
            op.shape.segments_or(self.default_segments),
            distance,
            &self.lod,
        );

        let make = |rim: Rim, points: Vec<Point2<f64>>, position: Vector3<f64>| OutlineLoop {
            key: format!("{}{}", key_prefix, rim),
            rim,
            axis,
            direction,
            points,
            position,
            rotation,
        };

        match op.shape {
            Shape::Cylinder { radius, height, .. } => {
                let half = travel * (height / 2.0);
                vec![
                    make(Rim::Top, circle(radius, segments), center - half),
                    make(Rim::Bottom, circle(radius, segments), center + half),
                ]
            }
            Shape::Box {
                width,
                height,
                length,
            } => {
                let half = travel * (height / 2.0);
                vec![
                    make(Rim::Top, rectangle(width, length), center - half),
                    make(Rim::Bottom, rectangle(width, length), center + half),
                ]
            }
            Shape::Sphere { radius, .. } => {
                vec![make(Rim::Equator, circle(radius, segments), center)]
            }
        }
    }

    /// Outlines of every subtractive operation of an element.
    ///
    /// Keys are `{element_id}_hole_{operation_index}_{rim}`, where the index
    /// counts all operations of the element.
    pub fn element_outlines(
        &self,
        element_id: &str,
        geometry: &ElementGeometry,
        context: Option<&Vector3<f64>>,
        distance: Option<f64>,
    ) -> Vec<OutlineLoop> {
        geometry
            .operations
            .iter()
            .enumerate()
            .filter(|(_, op)| op.kind == BooleanOp::Subtract)
            .flat_map(|(index, op)| {
                let prefix = format!("{}_hole_{}_", element_id, index);
                self.reconstruct_lod(op, context, distance, &prefix)
            })
            .collect()
    }
}
