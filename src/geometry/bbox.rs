// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bounding volume utilities

use super::Vertex;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn from_vertices(vertices: &[Vertex]) -> Self {
        let mut bbox = Self::empty();
        for vertex in vertices {
            bbox.expand_to_include(&vertex.position);
        }
        bbox
    }

    pub fn expand_to_include(&mut self, point: &Point3<f64>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);

        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    pub fn volume(&self) -> f64 {
        let size = self.size();
        size.x * size.y * size.z
    }

    pub fn contains(&self, point: &Point3<f64>, tolerance: f64) -> bool {
        point.x >= self.min.x - tolerance
            && point.y >= self.min.y - tolerance
            && point.z >= self.min.z - tolerance
            && point.x <= self.max.x + tolerance
            && point.y <= self.max.y + tolerance
            && point.z <= self.max.z + tolerance
    }

    /// Whether the boxes share any volume; boxes that only touch within `tolerance` do not
    pub fn intersects(&self, other: &BoundingBox, tolerance: f64) -> bool {
        self.min.x < other.max.x - tolerance
            && other.min.x < self.max.x - tolerance
            && self.min.y < other.max.y - tolerance
            && other.min.y < self.max.y - tolerance
            && self.min.z < other.max.z - tolerance
            && other.min.z < self.max.z - tolerance
    }

    /// Check if two bounding boxes are approximately equal within tolerance
    pub fn approx_eq(&self, other: &BoundingBox, tolerance: f64) -> bool {
        (self.min - other.min).amax() < tolerance && (self.max - other.max).amax() < tolerance
    }
}

/// Bounding sphere used for coarse hit-testing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingSphere {
    pub center: Point3<f64>,
    pub radius: f64,
}

impl BoundingSphere {
    /// Sphere around the box centre reaching the farthest vertex
    pub fn from_vertices(vertices: &[Vertex], bbox: &BoundingBox) -> Self {
        if vertices.is_empty() {
            return Self {
                center: Point3::origin(),
                radius: 0.0,
            };
        }
        let center = bbox.center();
        let radius = vertices
            .iter()
            .map(|v| (v.position - center).norm())
            .fold(0.0, f64::max);
        Self { center, radius }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box() {
        let mut bbox = BoundingBox::empty();
        assert!(bbox.is_empty());
        bbox.expand_to_include(&Point3::new(1.0, 2.0, 3.0));
        bbox.expand_to_include(&Point3::new(-1.0, -2.0, -3.0));

        assert_eq!(bbox.min, Point3::new(-1.0, -2.0, -3.0));
        assert_eq!(bbox.max, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(bbox.center(), Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bbox.volume(), 48.0);
        assert!(bbox.contains(&Point3::new(0.5, 0.5, 0.5), 0.0));
    }

    #[test]
    fn test_intersects_ignores_touching_faces() {
        let a = BoundingBox::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let touching = BoundingBox::new(Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        let overlapping = BoundingBox::new(Point3::new(0.5, 0.5, 0.5), Point3::new(2.0, 2.0, 2.0));

        assert!(!a.intersects(&touching, 1e-9));
        assert!(a.intersects(&overlapping, 1e-9));
        assert!(overlapping.intersects(&a, 1e-9));
    }

    #[test]
    fn test_bounding_sphere() {
        let vertices = vec![
            Vertex::new(Point3::new(-1.0, 0.0, 0.0), Vector3::x()),
            Vertex::new(Point3::new(1.0, 0.0, 0.0), Vector3::x()),
        ];
        let bbox = BoundingBox::from_vertices(&vertices);
        let sphere = BoundingSphere::from_vertices(&vertices, &bbox);
        assert_eq!(sphere.center, Point3::origin());
        assert_eq!(sphere.radius, 1.0);
    }
}
