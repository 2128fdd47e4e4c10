// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh representation and cleanup passes

use super::{BoundingBox, BoundingSphere};
use ahash::{AHashMap, AHashSet};
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl Vertex {
    pub fn new(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self { position, normal }
    }

    pub fn transform(&mut self, matrix: &Matrix4<f64>, normal_matrix: &Matrix4<f64>) {
        self.position = matrix.transform_point(&self.position);
        let normal = normal_matrix.transform_vector(&self.normal);
        self.normal = normal.try_normalize(1e-12).unwrap_or(normal);
    }

    /// Linear interpolation between two vertices
    pub fn interpolate(&self, other: &Vertex, t: f64) -> Vertex {
        Vertex {
            position: self.position + (other.position - self.position) * t,
            normal: self.normal + (other.normal - self.normal) * t,
        }
    }
}

/// Triangle defined by three vertex indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    pub fn new(indices: [usize; 3]) -> Self {
        Self { indices }
    }

    pub fn is_degenerate(&self) -> bool {
        let [a, b, c] = self.indices;
        a == b || b == c || a == c
    }
}

/// Bounding volumes computed by [`Mesh::compute_bounding_volumes`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingVolumes {
    pub bbox: BoundingBox,
    pub sphere: BoundingSphere,
}

/// Counts reported by [`Mesh::simplify`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimplifyReport {
    pub welded_vertices: usize,
    pub removed_triangles: usize,
    pub orphaned_vertices: usize,
}

/// Triangular mesh
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
    /// Cached bounds; cleared by every mutating operation
    #[serde(skip)]
    bounds: Option<BoundingVolumes>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn empty() -> Self {
        Self::new()
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
            bounds: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        self.bounds = None;
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a triangle
    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Transform all vertices by a matrix
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        // Normals use the inverse transpose
        let normal_matrix = matrix
            .try_inverse()
            .map(|m| m.transpose())
            .unwrap_or(*matrix);
        for vertex in &mut self.vertices {
            vertex.transform(matrix, &normal_matrix);
        }
        self.bounds = None;
    }

    /// Returns a transformed copy
    pub fn transformed(&self, matrix: &Matrix4<f64>) -> Mesh {
        let mut mesh = self.clone();
        mesh.transform(matrix);
        mesh
    }

    /// Compute bounding box
    pub fn bounding_box(&self) -> BoundingBox {
        match &self.bounds {
            Some(bounds) => bounds.bbox,
            None => BoundingBox::from_vertices(&self.vertices),
        }
    }

    /// Bounding volumes from the last [`Mesh::compute_bounding_volumes`] call
    pub fn bounding_volumes(&self) -> Option<&BoundingVolumes> {
        self.bounds.as_ref()
    }

    /// Recompute and store the bounding box and sphere
    pub fn compute_bounding_volumes(&mut self) -> BoundingVolumes {
        let bbox = BoundingBox::from_vertices(&self.vertices);
        let sphere = BoundingSphere::from_vertices(&self.vertices, &bbox);
        let bounds = BoundingVolumes { bbox, sphere };
        self.bounds = Some(bounds);
        bounds
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get triangle count
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Merge with another mesh (concatenation, no boolean)
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);

        for triangle in &other.triangles {
            self.triangles.push(Triangle::new([
                triangle.indices[0] + offset,
                triangle.indices[1] + offset,
                triangle.indices[2] + offset,
            ]));
        }
        self.bounds = None;
    }

    /// Weld vertices that are within epsilon distance of each other.
    ///
    /// Positions are bucketed on an epsilon grid; only the 27 neighbouring
    /// cells are searched. Returns the number of vertices removed.
    pub fn weld_vertices(&mut self, epsilon: f64) -> usize {
        if self.vertices.is_empty() || epsilon <= 0.0 {
            return 0;
        }

        let original_count = self.vertices.len();
        let cell = |p: &Point3<f64>| {
            (
                (p.x / epsilon).floor() as i64,
                (p.y / epsilon).floor() as i64,
                (p.z / epsilon).floor() as i64,
            )
        };

        let mut grid: AHashMap<(i64, i64, i64), Vec<usize>> = AHashMap::new();
        let mut new_vertices: Vec<Vertex> = Vec::with_capacity(original_count);
        let mut remap: Vec<usize> = vec![0; original_count];

        for (i, vertex) in self.vertices.iter().enumerate() {
            let (cx, cy, cz) = cell(&vertex.position);
            let mut found = None;
            'search: for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        if let Some(bucket) = grid.get(&(cx + dx, cy + dy, cz + dz)) {
                            for &j in bucket {
                                if (new_vertices[j].position - vertex.position).norm() < epsilon {
                                    found = Some(j);
                                    break 'search;
                                }
                            }
                        }
                    }
                }
            }

            remap[i] = match found {
                Some(j) => j,
                None => {
                    let j = new_vertices.len();
                    new_vertices.push(*vertex);
                    grid.entry((cx, cy, cz)).or_default().push(j);
                    j
                }
            };
        }

        for triangle in &mut self.triangles {
            for index in &mut triangle.indices {
                *index = remap[*index];
            }
        }

        self.vertices = new_vertices;
        self.bounds = None;
        original_count - self.vertices.len()
    }

    /// Remove degenerate triangles (repeated indices or near-zero area) and
    /// duplicate triangles (same vertex set, any rotation of the winding).
    /// Returns the number of triangles removed.
    pub fn remove_duplicate_triangles(&mut self, area_epsilon: f64) -> usize {
        let original_count = self.triangles.len();
        let mut seen: AHashSet<[usize; 3]> = AHashSet::with_capacity(original_count);
        let vertices = &self.vertices;

        self.triangles.retain(|triangle| {
            if triangle.is_degenerate() || triangle.indices.iter().any(|&i| i >= vertices.len()) {
                return false;
            }
            let [a, b, c] = triangle.indices;
            let p0 = vertices[a].position;
            let area = (vertices[b].position - p0)
                .cross(&(vertices[c].position - p0))
                .norm()
                * 0.5;
            if area < area_epsilon {
                return false;
            }

            // Rotate so the smallest index leads; winding is preserved
            let canonical = if a <= b && a <= c {
                [a, b, c]
            } else if b <= a && b <= c {
                [b, c, a]
            } else {
                [c, a, b]
            };
            seen.insert(canonical)
        });

        original_count - self.triangles.len()
    }

    /// Remove orphaned vertices (vertices not referenced by any triangle).
    /// Returns the number of vertices removed.
    pub fn remove_orphaned_vertices(&mut self) -> usize {
        let mut used = vec![false; self.vertices.len()];
        for triangle in &self.triangles {
            for &index in &triangle.indices {
                used[index] = true;
            }
        }

        let mut remap = vec![0; self.vertices.len()];
        let mut new_vertices = Vec::with_capacity(self.vertices.len());
        for (old_index, &is_used) in used.iter().enumerate() {
            if is_used {
                remap[old_index] = new_vertices.len();
                new_vertices.push(self.vertices[old_index]);
            }
        }

        for triangle in &mut self.triangles {
            for index in &mut triangle.indices {
                *index = remap[*index];
            }
        }

        let removed = self.vertices.len() - new_vertices.len();
        self.vertices = new_vertices;
        self.bounds = None;
        removed
    }

    /// Recompute vertex normals from triangle geometry.
    /// Face normals are area-weighted and averaged at shared vertices.
    pub fn recompute_normals(&mut self) {
        if self.vertices.is_empty() || self.triangles.is_empty() {
            return;
        }

        let mut normal_sums: Vec<Vector3<f64>> = vec![Vector3::zeros(); self.vertices.len()];

        for triangle in &self.triangles {
            let v0 = self.vertices[triangle.indices[0]].position;
            let v1 = self.vertices[triangle.indices[1]].position;
            let v2 = self.vertices[triangle.indices[2]].position;

            // Unnormalized cross product is already area-weighted
            let face_normal = (v1 - v0).cross(&(v2 - v0));
            if face_normal.norm() > 1e-12 {
                for &idx in &triangle.indices {
                    normal_sums[idx] += face_normal;
                }
            }
        }

        for (vertex, sum) in self.vertices.iter_mut().zip(normal_sums) {
            vertex.normal = sum.try_normalize(1e-12).unwrap_or_else(Vector3::z);
        }
    }

    /// Full cleanup pass run after boolean evaluation.
    ///
    /// Welds coincident vertices, drops degenerate and duplicate triangles,
    /// removes orphaned vertices, recomputes normals and bounding volumes.
    pub fn simplify(&mut self, weld_epsilon: f64) -> SimplifyReport {
        let welded_vertices = self.weld_vertices(weld_epsilon);
        let removed_triangles = self.remove_duplicate_triangles(weld_epsilon * weld_epsilon);
        let orphaned_vertices = self.remove_orphaned_vertices();
        self.recompute_normals();
        self.compute_bounding_volumes();

        SimplifyReport {
            welded_vertices,
            removed_triangles,
            orphaned_vertices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;

    #[test]
    fn test_recompute_normals() {
        let mut mesh = Primitive::cuboid(10.0, 10.0, 10.0).to_mesh();
        mesh.recompute_normals();

        assert!(mesh.vertices.iter().all(|v| {
            let norm = v.normal.norm();
            norm > 0.9 && norm < 1.1
        }));
    }

    #[test]
    fn test_weld_collapses_face_split_cube() {
        let mut mesh = Primitive::cuboid(2.0, 2.0, 2.0).to_mesh();
        let before = mesh.vertex_count();
        let removed = mesh.weld_vertices(1e-6);
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(removed, before - 8);
    }

    #[test]
    fn test_remove_duplicate_and_degenerate_triangles() {
        let mut mesh = Mesh::new();
        let a = mesh.add_vertex(Vertex::new(Point3::new(0.0, 0.0, 0.0), Vector3::z()));
        let b = mesh.add_vertex(Vertex::new(Point3::new(1.0, 0.0, 0.0), Vector3::z()));
        let c = mesh.add_vertex(Vertex::new(Point3::new(0.0, 1.0, 0.0), Vector3::z()));
        mesh.add_triangle(Triangle::new([a, b, c]));
        mesh.add_triangle(Triangle::new([b, c, a]));
        mesh.add_triangle(Triangle::new([a, a, c]));

        let removed = mesh.remove_duplicate_triangles(1e-12);
        assert_eq!(removed, 2);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_simplify_sets_bounding_volumes() {
        let mut mesh = Primitive::cuboid(4.0, 2.0, 6.0).to_mesh();
        assert!(mesh.bounding_volumes().is_none());
        mesh.simplify(1e-6);

        let bounds = mesh.bounding_volumes().copied().unwrap();
        assert_eq!(bounds.bbox.min, Point3::new(-2.0, -1.0, -3.0));
        assert_eq!(bounds.bbox.max, Point3::new(2.0, 1.0, 3.0));

        mesh.transform(&Matrix4::new_translation(&Vector3::new(1.0, 0.0, 0.0)));
        assert!(mesh.bounding_volumes().is_none());
    }

    #[test]
    fn test_merge_offsets_indices() {
        let a = Primitive::cuboid(1.0, 1.0, 1.0).to_mesh();
        let mut merged = a.clone();
        merged.merge(&a);
        assert_eq!(merged.vertex_count(), a.vertex_count() * 2);
        assert_eq!(merged.triangles[a.triangle_count()].indices[0], a.triangles[0].indices[0] + a.vertex_count());
    }
}
