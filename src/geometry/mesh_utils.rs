// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh validation utilities

use super::Mesh;
use ahash::AHashMap;

/// Undirected edge, smaller index first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Edge {
    v0: usize,
    v1: usize,
}

impl Edge {
    fn new(v0: usize, v1: usize) -> Self {
        if v0 < v1 {
            Self { v0, v1 }
        } else {
            Self { v0: v1, v1: v0 }
        }
    }
}

fn build_edge_counts(mesh: &Mesh) -> AHashMap<Edge, u32> {
    let mut edge_counts: AHashMap<Edge, u32> = AHashMap::new();

    for triangle in &mesh.triangles {
        let [a, b, c] = triangle.indices;
        for edge in [Edge::new(a, b), Edge::new(b, c), Edge::new(c, a)] {
            *edge_counts.entry(edge).or_insert(0) += 1;
        }
    }

    edge_counts
}

/// Check if mesh is manifold (each edge shared by at most 2 triangles)
pub fn is_manifold(mesh: &Mesh) -> bool {
    build_edge_counts(mesh).values().all(|&count| count <= 2)
}

/// Check if mesh is closed (each edge shared by exactly 2 triangles)
pub fn is_closed(mesh: &Mesh) -> bool {
    build_edge_counts(mesh).values().all(|&count| count == 2)
}

/// Signed volume by the divergence theorem; positive for outward winding
pub fn signed_volume(mesh: &Mesh) -> f64 {
    mesh.triangles
        .iter()
        .map(|t| {
            let a = mesh.vertices[t.indices[0]].position.coords;
            let b = mesh.vertices[t.indices[1]].position.coords;
            let c = mesh.vertices[t.indices[2]].position.coords;
            a.dot(&b.cross(&c)) / 6.0
        })
        .sum()
}

/// Mesh validation report
#[derive(Debug, Clone, Copy)]
pub struct MeshValidation {
    pub is_manifold: bool,
    pub is_closed: bool,
    pub edge_count: usize,
    pub boundary_edge_count: usize,
    pub signed_volume: f64,
}

pub fn validate_mesh(mesh: &Mesh) -> MeshValidation {
    let edge_counts = build_edge_counts(mesh);

    MeshValidation {
        is_manifold: edge_counts.values().all(|&count| count <= 2),
        is_closed: edge_counts.values().all(|&count| count == 2),
        edge_count: edge_counts.len(),
        boundary_edge_count: edge_counts.values().filter(|&&count| count == 1).count(),
        signed_volume: signed_volume(mesh),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;

    #[test]
    fn test_cube_is_manifold() {
        // Faces carry their own vertices, so the raw cube is open
        let mesh = Primitive::cuboid(10.0, 10.0, 10.0).to_mesh();
        assert!(is_manifold(&mesh));
        assert!(!is_closed(&mesh));
    }

    #[test]
    fn test_welded_cube_is_closed() {
        let mut mesh = Primitive::cuboid(10.0, 10.0, 10.0).to_mesh();
        mesh.weld_vertices(1e-6);
        let validation = validate_mesh(&mesh);

        assert!(validation.is_closed);
        assert_eq!(validation.edge_count, 18);
        assert_eq!(validation.boundary_edge_count, 0);
        assert!((validation.signed_volume - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_cylinder_is_closed() {
        let mesh = Primitive::cylinder(5.0, 10.0, 32).to_mesh();
        assert!(is_closed(&mesh), "Cylinder should be closed");
    }
}
