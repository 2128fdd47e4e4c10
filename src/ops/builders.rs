// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Hole helpers producing operation descriptors

use crate::config::{CounterboreProfile, PipelineConfig};
use crate::error::{ensure_positive, CutError, Result};
use crate::ops::axis::{Axis, Direction, DirectionResolver};
use crate::ops::operation::{Operation, Shape};
use nalgebra::Vector3;
use tracing::debug;

/// Stages whose combined depth reaches this close to the far face are treated as through cuts
const THROUGH_TOLERANCE: f64 = 1e-9;

/// A single round hole
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoleSpec {
    pub radius: f64,
    pub axis: Axis,
    pub direction: Option<Direction>,
    /// Explicit depth; defaults to parent thickness plus the depth extension
    pub depth: Option<f64>,
    /// Zero uses the configured default
    pub segments: u32,
}

impl HoleSpec {
    pub fn new(radius: f64, axis: Axis) -> Self {
        Self {
            radius,
            axis,
            direction: None,
            depth: None,
            segments: 0,
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn depth(mut self, depth: f64) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn segments(mut self, segments: u32) -> Self {
        self.segments = segments;
        self
    }
}

/// Rectangular pattern of identical holes on the face orthogonal to the hole axis
#[derive(Debug, Clone, PartialEq)]
pub struct GridSpec {
    pub hole: HoleSpec,
    pub rows: usize,
    pub cols: usize,
    /// Column then row spacing, along [`Axis::face_axes`]
    pub spacing: [f64; 2],
    /// Distance from the face edge to the first hole centre
    pub margin: [f64; 2],
    /// `(row, col)` cells left undrilled
    pub skip: Vec<(usize, usize)>,
    /// Face size along the two face axes
    pub face_extent: [f64; 2],
    /// Centre of the face pattern in element coordinates
    pub anchor: Vector3<f64>,
}

/// One stage of a counterbore
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageSpec {
    pub radius: f64,
    pub depth: f64,
    pub direction: Option<Direction>,
}

/// Two coaxial stages: a wide shallow seat followed by a narrower bore
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterboreSpec {
    pub axis: Axis,
    pub first: StageSpec,
    pub second: StageSpec,
    pub segments: u32,
}

impl CounterboreSpec {
    pub fn from_profile(profile: &CounterboreProfile, axis: Axis, direction: Option<Direction>) -> Self {
        Self {
            axis,
            first: StageSpec {
                radius: profile.first.radius,
                depth: profile.first.depth,
                direction,
            },
            second: StageSpec {
                radius: profile.second.radius,
                depth: profile.second.depth,
                direction,
            },
            segments: 0,
        }
    }
}

/// Turns hole descriptions into subtractive operations
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HoleBuilder {
    resolver: DirectionResolver,
}

impl HoleBuilder {
    pub fn new(resolver: DirectionResolver) -> Self {
        Self { resolver }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(DirectionResolver::new(config.depth_extension))
    }

    pub fn resolver(&self) -> &DirectionResolver {
        &self.resolver
    }

    /// One cylinder centred on `position`, spanning the resolved depth
    pub fn single_hole(
        &self,
        spec: &HoleSpec,
        position: Vector3<f64>,
        parent_thickness: f64,
    ) -> Result<Operation> {
        ensure_positive("radius", spec.radius)?;
        if let Some(depth) = spec.depth {
            ensure_positive("depth", depth)?;
        } else {
            ensure_positive("parent_thickness", parent_thickness)?;
        }

        let orientation = self
            .resolver
            .resolve(spec.axis, spec.direction, spec.depth, parent_thickness);

        Ok(
            Operation::subtract(Shape::cylinder(spec.radius, orientation.depth, spec.segments))
                .at(position)
                .rotated(orientation.rotation),
        )
    }

    /// Holes laid out row by row; skipped cells are omitted from the output
    pub fn hole_grid(&self, grid: &GridSpec, parent_thickness: f64) -> Result<Vec<Operation>> {
        for (name, value) in [
            ("spacing", grid.spacing[0]),
            ("spacing", grid.spacing[1]),
            ("margin", grid.margin[0]),
            ("margin", grid.margin[1]),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(CutError::invalid(
                    name,
                    format!("must be a non-negative number, got {}", value),
                ));
            }
        }

        let (u_axis, v_axis) = grid.hole.axis.face_axes();
        let u = u_axis.unit();
        let v = v_axis.unit();
        let u0 = -grid.face_extent[0] / 2.0 + grid.margin[0];
        let v0 = -grid.face_extent[1] / 2.0 + grid.margin[1];

        // Counts come from element files, so the preallocation is capped
        let mut ops = Vec::with_capacity(grid.rows.saturating_mul(grid.cols).min(1024));
        for row in 0..grid.rows {
            for col in 0..grid.cols {
                if grid.skip.contains(&(row, col)) {
                    continue;
                }
                let offset_u = u0 + col as f64 * grid.spacing[0];
                let offset_v = v0 + row as f64 * grid.spacing[1];
                let position = grid.anchor + u * offset_u + v * offset_v;
                ops.push(self.single_hole(&grid.hole, position, parent_thickness)?);
            }
        }

        debug!(
            "Hole grid {}x{} on {} axis: {} holes",
            grid.rows,
            grid.cols,
            grid.hole.axis,
            ops.len()
        );
        Ok(ops)
    }

    /// Two-stage hole.
    ///
    /// Both stages share `position`; each is slid along its own travel axis so
    /// the first starts at the entry face and the second continues below it.
    /// Stage ends lying on a free face are grown by the depth extension, and the
    /// second stage overlaps back into the first by the same amount.
    pub fn counterbore_hole(
        &self,
        spec: &CounterboreSpec,
        position: Vector3<f64>,
        parent_thickness: f64,
    ) -> Result<[Operation; 2]> {
        let first_direction = self.resolver.direction_for(spec.axis, spec.first.direction);
        let second_direction = self.resolver.direction_for(spec.axis, spec.second.direction);
        if first_direction != second_direction {
            return Err(CutError::MismatchedDirection {
                first: first_direction.to_string(),
                second: second_direction.to_string(),
            });
        }

        let thickness = ensure_positive("parent_thickness", parent_thickness)?;
        ensure_positive("radius", spec.first.radius)?;
        ensure_positive("radius", spec.second.radius)?;
        ensure_positive("depth", spec.first.depth)?;
        ensure_positive("depth", spec.second.depth)?;

        let extension = self.resolver.depth_extension;
        let rotation = first_direction.rotation();
        let entry = -thickness / 2.0;

        // Spans along local +Y (the travel direction), measured from the mid-plane
        let first_span = (entry - extension, entry + spec.first.depth);
        let cut = spec.first.depth + spec.second.depth;
        let through = cut >= thickness - THROUGH_TOLERANCE;
        let second_span = (
            entry + spec.first.depth - extension.min(spec.first.depth),
            entry + cut + if through { extension } else { 0.0 },
        );

        let stage = |radius: f64, (start, end): (f64, f64)| {
            Operation::subtract(Shape::cylinder(radius, end - start, spec.segments))
                .at(position)
                .rotated(rotation)
                .with_axial_offset((start + end) / 2.0)
        };

        Ok([
            stage(spec.first.radius, first_span),
            stage(spec.second.radius, second_span),
        ])
    }

    /// Counterbore with dimensions from a named configuration preset
    pub fn counterbore_from_profile(
        &self,
        config: &PipelineConfig,
        profile: &str,
        axis: Axis,
        direction: Option<Direction>,
        position: Vector3<f64>,
        parent_thickness: f64,
    ) -> Result<[Operation; 2]> {
        let preset = config
            .counterbore_profile(profile)
            .ok_or_else(|| CutError::UnknownProfile(profile.to_string()))?;
        let spec = CounterboreSpec::from_profile(preset, axis, direction);
        self.counterbore_hole(&spec, position, parent_thickness)
    }
}
