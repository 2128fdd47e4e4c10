// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric primitives generator
//!
//! Every primitive is centered on the origin. Cylinders run along +Y, which is
//! also the travel direction of a hole before its rotation is applied.

use super::{Mesh, Triangle, Vertex};
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

/// Segment count used when a caller passes zero
pub const DEFAULT_SEGMENTS: u32 = 32;

/// Geometric primitives
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Cuboid { width: f64, height: f64, length: f64 },
    Cylinder { radius: f64, height: f64, segments: u32 },
    Sphere { radius: f64, segments: u32 },
}

impl Primitive {
    pub fn cuboid(width: f64, height: f64, length: f64) -> Self {
        Self::Cuboid {
            width,
            height,
            length,
        }
    }

    pub fn cylinder(radius: f64, height: f64, segments: u32) -> Self {
        let segments = if segments >= 3 { segments } else { DEFAULT_SEGMENTS };
        Self::Cylinder {
            radius,
            height,
            segments,
        }
    }

    pub fn sphere(radius: f64, segments: u32) -> Self {
        let segments = if segments >= 4 { segments } else { DEFAULT_SEGMENTS };
        Self::Sphere { radius, segments }
    }

    pub fn to_mesh(&self) -> Mesh {
        match *self {
            Self::Cuboid {
                width,
                height,
                length,
            } => generate_cuboid_mesh(Vector3::new(width, height, length)),
            Self::Cylinder {
                radius,
                height,
                segments,
            } => generate_cylinder_mesh(radius, height, segments),
            Self::Sphere { radius, segments } => generate_sphere_mesh(radius, segments),
        }
    }
}

fn generate_cuboid_mesh(size: Vector3<f64>) -> Mesh {
    let mut mesh = Mesh::with_capacity(36, 12);
    let h = size / 2.0;

    let positions = [
        Point3::new(-h.x, -h.y, -h.z),
        Point3::new(h.x, -h.y, -h.z),
        Point3::new(h.x, h.y, -h.z),
        Point3::new(-h.x, h.y, -h.z),
        Point3::new(-h.x, -h.y, h.z),
        Point3::new(h.x, -h.y, h.z),
        Point3::new(h.x, h.y, h.z),
        Point3::new(-h.x, h.y, h.z),
    ];

    // Counter-clockwise when viewed from outside
    let faces = [
        // Front (z+)
        ([4, 5, 6], Vector3::new(0.0, 0.0, 1.0)),
        ([4, 6, 7], Vector3::new(0.0, 0.0, 1.0)),
        // Back (z-)
        ([1, 0, 3], Vector3::new(0.0, 0.0, -1.0)),
        ([1, 3, 2], Vector3::new(0.0, 0.0, -1.0)),
        // Right (x+)
        ([5, 1, 2], Vector3::new(1.0, 0.0, 0.0)),
        ([5, 2, 6], Vector3::new(1.0, 0.0, 0.0)),
        // Left (x-)
        ([0, 4, 7], Vector3::new(-1.0, 0.0, 0.0)),
        ([0, 7, 3], Vector3::new(-1.0, 0.0, 0.0)),
        // Top (y+)
        ([7, 6, 2], Vector3::new(0.0, 1.0, 0.0)),
        ([7, 2, 3], Vector3::new(0.0, 1.0, 0.0)),
        // Bottom (y-)
        ([0, 1, 5], Vector3::new(0.0, -1.0, 0.0)),
        ([0, 5, 4], Vector3::new(0.0, -1.0, 0.0)),
    ];

    for (indices, normal) in faces {
        let v0 = mesh.add_vertex(Vertex::new(positions[indices[0]], normal));
        let v1 = mesh.add_vertex(Vertex::new(positions[indices[1]], normal));
        let v2 = mesh.add_vertex(Vertex::new(positions[indices[2]], normal));
        mesh.add_triangle(Triangle::new([v0, v1, v2]));
    }

    mesh
}

fn generate_cylinder_mesh(radius: f64, height: f64, segments: u32) -> Mesh {
    let segments = segments as usize;
    let mut mesh = Mesh::with_capacity(2 + segments * 2, segments * 4);
    let half = height / 2.0;

    let bottom_center = mesh.add_vertex(Vertex::new(Point3::new(0.0, -half, 0.0), -Vector3::y()));
    let top_center = mesh.add_vertex(Vertex::new(Point3::new(0.0, half, 0.0), Vector3::y()));

    let mut bottom = Vec::with_capacity(segments);
    let mut top = Vec::with_capacity(segments);
    for i in 0..segments {
        let angle = 2.0 * PI * i as f64 / segments as f64;
        let (sin, cos) = angle.sin_cos();
        let radial = Vector3::new(cos, 0.0, sin);
        bottom.push(mesh.add_vertex(Vertex::new(
            Point3::new(radius * cos, -half, radius * sin),
            radial,
        )));
        top.push(mesh.add_vertex(Vertex::new(
            Point3::new(radius * cos, half, radius * sin),
            radial,
        )));
    }

    for i in 0..segments {
        let next = (i + 1) % segments;
        // Caps
        mesh.add_triangle(Triangle::new([bottom_center, bottom[i], bottom[next]]));
        mesh.add_triangle(Triangle::new([top_center, top[next], top[i]]));
        // Side quad, rim vertices shared so the mesh stays closed
        mesh.add_triangle(Triangle::new([bottom[i], top[i], bottom[next]]));
        mesh.add_triangle(Triangle::new([top[i], top[next], bottom[next]]));
    }

    mesh.recompute_normals();
    mesh
}

fn generate_sphere_mesh(radius: f64, segments: u32) -> Mesh {
    let slices = segments as usize;
    let stacks = (slices / 2).max(4);
    let mut mesh = Mesh::with_capacity((stacks + 1) * (slices + 1), stacks * slices * 2);

    for i in 0..=stacks {
        let phi = PI * i as f64 / stacks as f64;
        let y = radius * phi.cos();
        let ring = radius * phi.sin();

        for j in 0..=slices {
            let theta = 2.0 * PI * j as f64 / slices as f64;
            let position = Point3::new(ring * theta.cos(), y, ring * theta.sin());
            let normal = position.coords.try_normalize(1e-12).unwrap_or_else(Vector3::y);
            mesh.add_vertex(Vertex::new(position, normal));
        }
    }

    for i in 0..stacks {
        for j in 0..slices {
            let first = i * (slices + 1) + j;
            let second = first + slices + 1;

            // Pole rows collapse to a point; skip the zero-area half
            if i != 0 {
                mesh.add_triangle(Triangle::new([first, first + 1, second]));
            }
            if i != stacks - 1 {
                mesh.add_triangle(Triangle::new([second, first + 1, second + 1]));
            }
        }
    }

    mesh
}
