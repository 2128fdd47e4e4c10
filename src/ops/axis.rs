// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Axis/direction resolution for holes
//!
//! A hole's local +Y is its travel direction. Each `(axis, direction)` pair maps
//! to one fixed Euler rotation that turns +Y onto that direction.

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use nalgebra::Vector3;

/// Axis a hole is drilled along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Travel direction of a hole along its axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Down,
    Up,
    Right,
    Left,
    Forward,
    Backward,
}

impl Axis {
    /// Direction used when none (or an invalid one) is given
    pub fn default_direction(self) -> Direction {
        match self {
            Axis::Y => Direction::Down,
            Axis::X => Direction::Right,
            Axis::Z => Direction::Forward,
        }
    }

    pub fn directions(self) -> [Direction; 2] {
        match self {
            Axis::Y => [Direction::Down, Direction::Up],
            Axis::X => [Direction::Right, Direction::Left],
            Axis::Z => [Direction::Forward, Direction::Backward],
        }
    }

    pub fn accepts(self, direction: Direction) -> bool {
        direction.axis() == self
    }

    pub fn unit(self) -> Vector3<f64> {
        match self {
            Axis::X => Vector3::x(),
            Axis::Y => Vector3::y(),
            Axis::Z => Vector3::z(),
        }
    }

    /// Index into xyz components
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// The two axes spanning the face a hole along `self` is drilled into
    pub fn face_axes(self) -> (Axis, Axis) {
        match self {
            Axis::Y => (Axis::X, Axis::Z),
            Axis::X => (Axis::Z, Axis::Y),
            Axis::Z => (Axis::X, Axis::Y),
        }
    }
}

impl Direction {
    pub fn axis(self) -> Axis {
        match self {
            Direction::Down | Direction::Up => Axis::Y,
            Direction::Right | Direction::Left => Axis::X,
            Direction::Forward | Direction::Backward => Axis::Z,
        }
    }

    /// Euler rotation (XYZ, radians) that maps +Y onto this direction
    pub fn rotation(self) -> Vector3<f64> {
        match self {
            Direction::Down => Vector3::new(PI, 0.0, 0.0),
            Direction::Up => Vector3::zeros(),
            Direction::Right => Vector3::new(0.0, 0.0, -FRAC_PI_2),
            Direction::Left => Vector3::new(0.0, 0.0, FRAC_PI_2),
            Direction::Forward => Vector3::new(FRAC_PI_2, 0.0, 0.0),
            Direction::Backward => Vector3::new(-FRAC_PI_2, 0.0, 0.0),
        }
    }

    /// Unit travel vector
    pub fn vector(self) -> Vector3<f64> {
        match self {
            Direction::Down => -Vector3::y(),
            Direction::Up => Vector3::y(),
            Direction::Right => Vector3::x(),
            Direction::Left => -Vector3::x(),
            Direction::Forward => Vector3::z(),
            Direction::Backward => -Vector3::z(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Down => "down",
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Left => "left",
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        })
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            other => Err(format!("unknown axis `{}`", other)),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "down" => Ok(Direction::Down),
            "up" => Ok(Direction::Up),
            "right" => Ok(Direction::Right),
            "left" => Ok(Direction::Left),
            "forward" => Ok(Direction::Forward),
            "backward" => Ok(Direction::Backward),
            other => Err(format!("unknown direction `{}`", other)),
        }
    }
}

/// Output of [`DirectionResolver::resolve`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoleOrientation {
    pub axis: Axis,
    pub direction: Direction,
    pub rotation: Vector3<f64>,
    pub depth: f64,
}

/// Maps semantic `(axis, direction)` pairs to rotations and depths
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionResolver {
    /// Added to the parent thickness for auto depth so cut faces never coincide
    pub depth_extension: f64,
}

impl Default for DirectionResolver {
    fn default() -> Self {
        Self {
            depth_extension: 0.1,
        }
    }
}

impl DirectionResolver {
    pub fn new(depth_extension: f64) -> Self {
        Self { depth_extension }
    }

    /// Pick the effective direction, falling back to the axis default.
    ///
    /// Omission is silent; a direction belonging to another axis warns.
    pub fn direction_for(&self, axis: Axis, direction: Option<Direction>) -> Direction {
        match direction {
            Some(d) if axis.accepts(d) => d,
            Some(d) => {
                let fallback = axis.default_direction();
                warn!(
                    "Direction `{}` is not valid for axis `{}`, using `{}`",
                    d, axis, fallback
                );
                fallback
            }
            None => axis.default_direction(),
        }
    }

    /// Parse a user-facing direction string; unknown strings fall back with a warning
    pub fn parse_direction(&self, axis: Axis, direction: Option<&str>) -> Direction {
        match direction.map(str::parse::<Direction>) {
            Some(Ok(d)) => self.direction_for(axis, Some(d)),
            Some(Err(reason)) => {
                let fallback = axis.default_direction();
                warn!("{} for axis `{}`, using `{}`", reason, axis, fallback);
                fallback
            }
            None => axis.default_direction(),
        }
    }

    /// Resolve orientation and depth.
    ///
    /// `depth` defaults to `parent_thickness + depth_extension`. Direction only
    /// ever changes the rotation.
    pub fn resolve(
        &self,
        axis: Axis,
        direction: Option<Direction>,
        depth: Option<f64>,
        parent_thickness: f64,
    ) -> HoleOrientation {
        let direction = self.direction_for(axis, direction);
        HoleOrientation {
            axis,
            direction,
            rotation: direction.rotation(),
            depth: depth.unwrap_or(parent_thickness + self.depth_extension),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::euler_xyz_to_rotation;

    #[test]
    fn test_every_rotation_maps_y_onto_direction() {
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            for direction in axis.directions() {
                let rotated = euler_xyz_to_rotation(&direction.rotation()) * Vector3::y();
                assert!(
                    (rotated - direction.vector()).norm() < 1e-12,
                    "{} maps +Y to {:?}",
                    direction,
                    rotated
                );
                assert_eq!(direction.axis(), axis);
            }
        }
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let resolver = DirectionResolver::default();
        let a = resolver.resolve(Axis::X, Some(Direction::Left), None, 2.0);
        let b = resolver.resolve(Axis::X, Some(Direction::Left), None, 2.0);
        assert_eq!(a, b);
        assert!((a.depth - 2.1).abs() < 1e-12);
    }

    #[test]
    fn test_omitted_direction_equals_default() {
        let resolver = DirectionResolver::default();
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            assert_eq!(
                resolver.resolve(axis, None, None, 1.2),
                resolver.resolve(axis, Some(axis.default_direction()), None, 1.2)
            );
        }
    }

    #[test]
    fn test_invalid_direction_falls_back() {
        let resolver = DirectionResolver::default();
        let resolved = resolver.resolve(Axis::Z, Some(Direction::Up), Some(3.0), 1.0);
        assert_eq!(resolved.direction, Direction::Forward);
        assert_eq!(resolved.depth, 3.0);

        assert_eq!(resolver.parse_direction(Axis::Y, Some("sideways")), Direction::Down);
        assert_eq!(resolver.parse_direction(Axis::Y, Some("UP")), Direction::Up);
    }
}
