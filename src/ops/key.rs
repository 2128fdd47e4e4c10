// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Canonical grouping and cache keys
//!
//! Shape parameters are compared by exact bit pattern; rotations and positions
//! are quantized so float jitter below the configured precision cannot split a
//! group or miss the cache.

use crate::geometry::BooleanOp;
use crate::ops::operation::{Operation, Shape};
use crate::utils::quantize;
use sha2::{Digest, Sha256};
use std::fmt;

/// Decimal places kept for positions and axial offsets in cache keys
pub const POSITION_PRECISION: u32 = 6;

fn bits(value: f64) -> u64 {
    // -0.0 and 0.0 must produce the same key
    (value + 0.0).to_bits()
}

/// Shape parameters by exact bit pattern, with segment defaults resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeKey {
    Cylinder { radius: u64, height: u64, segments: u32 },
    Box { width: u64, height: u64, length: u64 },
    Sphere { radius: u64, segments: u32 },
}

impl ShapeKey {
    pub fn new(shape: &Shape, default_segments: u32) -> Self {
        let segments = shape.segments_or(default_segments);
        match *shape {
            Shape::Cylinder { radius, height, .. } => ShapeKey::Cylinder {
                radius: bits(radius),
                height: bits(height),
                segments,
            },
            Shape::Box {
                width,
                height,
                length,
            } => ShapeKey::Box {
                width: bits(width),
                height: bits(height),
                length: bits(length),
            },
            Shape::Sphere { radius, .. } => ShapeKey::Sphere {
                radius: bits(radius),
                segments,
            },
        }
    }
}

impl fmt::Display for ShapeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ShapeKey::Cylinder {
                radius,
                height,
                segments,
            } => write!(
                f,
                "cylinder({},{},{})",
                f64::from_bits(radius),
                f64::from_bits(height),
                segments
            ),
            ShapeKey::Box {
                width,
                height,
                length,
            } => write!(
                f,
                "box({},{},{})",
                f64::from_bits(width),
                f64::from_bits(height),
                f64::from_bits(length)
            ),
            ShapeKey::Sphere { radius, segments } => {
                write!(f, "sphere({},{})", f64::from_bits(radius), segments)
            }
        }
    }
}

/// Operations with equal group keys differ only by position and may be merged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub kind: BooleanOp,
    pub shape: ShapeKey,
    pub rotation: [i64; 3],
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}@r[{},{},{}]",
            self.kind, self.shape, self.rotation[0], self.rotation[1], self.rotation[2]
        )
    }
}

/// Group key plus quantized local position and axial offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpKey {
    pub group: GroupKey,
    pub position: [i64; 3],
    pub axial_offset: i64,
}

impl fmt::Display for OpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}p[{},{},{}]o{}",
            self.group, self.position[0], self.position[1], self.position[2], self.axial_offset
        )
    }
}

/// Base shape followed by the ordered operation keys.
///
/// World placement of the element is never part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub base: ShapeKey,
    pub ops: Vec<OpKey>,
}

impl CacheKey {
    /// Short hex SHA-256 digest of the canonical string
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.to_string().as_bytes());
        digest[..8].iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for op in &self.ops {
            write!(f, "|{}", op)?;
        }
        Ok(())
    }
}

/// Builds keys with a fixed rounding policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canonicalizer {
    pub rotation_precision: u32,
    pub default_segments: u32,
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self {
            rotation_precision: 4,
            default_segments: crate::geometry::DEFAULT_SEGMENTS,
        }
    }
}

impl Canonicalizer {
    pub fn new(rotation_precision: u32, default_segments: u32) -> Self {
        Self {
            rotation_precision,
            default_segments,
        }
    }

    pub fn shape_key(&self, shape: &Shape) -> ShapeKey {
        ShapeKey::new(shape, self.default_segments)
    }

    pub fn group_key(&self, op: &Operation) -> GroupKey {
        let r = &op.rotation;
        GroupKey {
            kind: op.kind,
            shape: self.shape_key(&op.shape),
            rotation: [
                quantize(r.x, self.rotation_precision),
                quantize(r.y, self.rotation_precision),
                quantize(r.z, self.rotation_precision),
            ],
        }
    }

    pub fn op_key(&self, op: &Operation) -> OpKey {
        let p = &op.position;
        OpKey {
            group: self.group_key(op),
            position: [
                quantize(p.x, POSITION_PRECISION),
                quantize(p.y, POSITION_PRECISION),
                quantize(p.z, POSITION_PRECISION),
            ],
            axial_offset: quantize(op.axial_offset, POSITION_PRECISION),
        }
    }

    pub fn cache_key(&self, base: &Shape, ops: &[Operation]) -> CacheKey {
        CacheKey {
            base: self.shape_key(base),
            ops: ops.iter().map(|op| self.op_key(op)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use std::f64::consts::PI;

    fn hole(x: f64) -> Operation {
        Operation::subtract(Shape::cylinder(0.8, 1.3, 0))
            .at(Vector3::new(x, 0.0, 0.0))
            .rotated(Vector3::new(PI, 0.0, 0.0))
    }

    #[test]
    fn test_position_is_not_part_of_group_key() {
        let canon = Canonicalizer::default();
        assert_eq!(canon.group_key(&hole(1.0)), canon.group_key(&hole(5.0)));
        assert_ne!(canon.op_key(&hole(1.0)), canon.op_key(&hole(5.0)));
    }

    #[test]
    fn test_rotation_jitter_is_absorbed() {
        let canon = Canonicalizer::default();
        let mut jittered = hole(1.0);
        jittered.rotation.x += 1e-7;
        assert_eq!(canon.group_key(&hole(1.0)), canon.group_key(&jittered));

        jittered.rotation.x += 1e-2;
        assert_ne!(canon.group_key(&hole(1.0)), canon.group_key(&jittered));
    }

    #[test]
    fn test_default_segments_resolve_before_keying() {
        let canon = Canonicalizer::new(4, 32);
        let implicit = Operation::subtract(Shape::cylinder(1.0, 1.0, 0));
        let explicit = Operation::subtract(Shape::cylinder(1.0, 1.0, 32));
        assert_eq!(canon.group_key(&implicit), canon.group_key(&explicit));
    }

    #[test]
    fn test_cache_key_is_ordered_and_stable() {
        let canon = Canonicalizer::default();
        let base = Shape::cuboid(250.0, 1.2, 80.0);
        let a = canon.cache_key(&base, &[hole(1.0), hole(2.0)]);
        let b = canon.cache_key(&base, &[hole(1.0), hole(2.0)]);
        let swapped = canon.cache_key(&base, &[hole(2.0), hole(1.0)]);

        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 16);
        assert_ne!(a, swapped);
    }

    #[test]
    fn test_negative_zero_matches_zero() {
        let canon = Canonicalizer::default();
        let a = canon.shape_key(&Shape::cuboid(1.0, 1.0, 1.0));
        let b = ShapeKey::new(&Shape::cuboid(1.0, 1.0, 1.0 + -0.0), 32);
        assert_eq!(a, b);
        assert_eq!(bits(-0.0), bits(0.0));
    }
}
