// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CSG (Constructive Solid Geometry) operations using BSP trees
//!
//! Meshes are converted to convex polygons, partitioned into BSP trees and
//! clipped against each other. Inputs must be closed and outward-wound.

use super::{Mesh, Triangle, Vertex};
use crate::error::{CutError, Result};
use nalgebra::Vector3;

const EPSILON: f64 = 1e-5;

const COPLANAR: u8 = 0;
const FRONT: u8 = 1;
const BACK: u8 = 2;
const SPANNING: u8 = 3;

#[derive(Debug, Clone, Copy)]
struct Plane {
    normal: Vector3<f64>,
    w: f64,
}

#[derive(Debug, Clone)]
struct Polygon {
    vertices: Vec<Vertex>,
    plane: Plane,
}

/// BSP tree node for CSG operations
#[derive(Debug, Clone, Default)]
struct BspNode {
    plane: Option<Plane>,
    front: Option<Box<BspNode>>,
    back: Option<Box<BspNode>>,
    polygons: Vec<Polygon>,
}

impl Plane {
    fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    fn distance(&self, vertex: &Vertex) -> f64 {
        self.normal.dot(&vertex.position.coords) - self.w
    }

    /// Split `polygon` by this plane into the four output lists
    fn split_polygon(
        &self,
        polygon: &Polygon,
        coplanar_front: &mut Vec<Polygon>,
        coplanar_back: &mut Vec<Polygon>,
        front: &mut Vec<Polygon>,
        back: &mut Vec<Polygon>,
    ) {
        let mut polygon_type = COPLANAR;
        let types: Vec<u8> = polygon
            .vertices
            .iter()
            .map(|v| {
                let t = self.distance(v);
                let kind = if t < -EPSILON {
                    BACK
                } else if t > EPSILON {
                    FRONT
                } else {
                    COPLANAR
                };
                polygon_type |= kind;
                kind
            })
            .collect();

        match polygon_type {
            COPLANAR => {
                if self.normal.dot(&polygon.plane.normal) > 0.0 {
                    coplanar_front.push(polygon.clone());
                } else {
                    coplanar_back.push(polygon.clone());
                }
            }
            FRONT => front.push(polygon.clone()),
            BACK => back.push(polygon.clone()),
            _ => {
                let n = polygon.vertices.len();
                let mut f = Vec::with_capacity(n + 1);
                let mut b = Vec::with_capacity(n + 1);

                for i in 0..n {
                    let j = (i + 1) % n;
                    let (ti, tj) = (types[i], types[j]);
                    let (vi, vj) = (&polygon.vertices[i], &polygon.vertices[j]);

                    if ti != BACK {
                        f.push(*vi);
                    }
                    if ti != FRONT {
                        b.push(*vi);
                    }
                    if ti | tj == SPANNING {
                        let denom = self.normal.dot(&(vj.position - vi.position));
                        let t = (self.w - self.normal.dot(&vi.position.coords)) / denom;
                        let v = vi.interpolate(vj, t);
                        f.push(v);
                        b.push(v);
                    }
                }

                if f.len() >= 3 {
                    front.push(Polygon {
                        vertices: f,
                        plane: polygon.plane,
                    });
                }
                if b.len() >= 3 {
                    back.push(Polygon {
                        vertices: b,
                        plane: polygon.plane,
                    });
                }
            }
        }
    }
}

impl Polygon {
    /// Builds a polygon, rejecting zero-area input
    fn new(vertices: Vec<Vertex>) -> Option<Self> {
        // Newell's method tolerates collinear leading vertices
        let mut normal = Vector3::zeros();
        for (i, current) in vertices.iter().enumerate() {
            let next = &vertices[(i + 1) % vertices.len()];
            let (c, n) = (current.position, next.position);
            normal.x += (c.y - n.y) * (c.z + n.z);
            normal.y += (c.z - n.z) * (c.x + n.x);
            normal.z += (c.x - n.x) * (c.y + n.y);
        }
        let normal = normal.try_normalize(1e-12)?;
        let w = normal.dot(&vertices[0].position.coords);
        Some(Self {
            vertices,
            plane: Plane { normal, w },
        })
    }

    fn flip(&mut self) {
        self.vertices.reverse();
        for v in &mut self.vertices {
            v.normal = -v.normal;
        }
        self.plane.flip();
    }
}

impl BspNode {
    fn new(polygons: Vec<Polygon>) -> Self {
        let mut node = Self::default();
        node.build(polygons);
        node
    }

    fn build(&mut self, polygons: Vec<Polygon>) {
        if polygons.is_empty() {
            return;
        }

        let plane = *self.plane.get_or_insert(polygons[0].plane);
        let mut front_polys = Vec::new();
        let mut back_polys = Vec::new();
        let mut coplanar = Vec::new();

        for poly in &polygons {
            let mut coplanar_back = Vec::new();
            plane.split_polygon(poly, &mut coplanar, &mut coplanar_back, &mut front_polys, &mut back_polys);
            coplanar.append(&mut coplanar_back);
        }
        self.polygons.append(&mut coplanar);

        if !front_polys.is_empty() {
            self.front.get_or_insert_with(Box::default).build(front_polys);
        }
        if !back_polys.is_empty() {
            self.back.get_or_insert_with(Box::default).build(back_polys);
        }
    }

    fn all_polygons(&self) -> Vec<Polygon> {
        let mut result = self.polygons.clone();
        if let Some(ref front) = self.front {
            result.extend(front.all_polygons());
        }
        if let Some(ref back) = self.back {
            result.extend(back.all_polygons());
        }
        result
    }

    /// Remove all polygons in `polygons` that are inside this tree
    fn clip_polygons(&self, polygons: &[Polygon]) -> Vec<Polygon> {
        let Some(plane) = self.plane else {
            return polygons.to_vec();
        };

        let mut front = Vec::new();
        let mut back = Vec::new();
        for poly in polygons {
            let mut coplanar_front = Vec::new();
            let mut coplanar_back = Vec::new();
            plane.split_polygon(poly, &mut coplanar_front, &mut coplanar_back, &mut front, &mut back);
            front.append(&mut coplanar_front);
            back.append(&mut coplanar_back);
        }

        let mut result = match self.front {
            Some(ref node) => node.clip_polygons(&front),
            None => front,
        };
        if let Some(ref node) = self.back {
            result.extend(node.clip_polygons(&back));
        }
        result
    }

    /// Remove all polygons in this tree that are inside `bsp`
    fn clip_to(&mut self, bsp: &BspNode) {
        self.polygons = bsp.clip_polygons(&self.polygons);
        if let Some(ref mut front) = self.front {
            front.clip_to(bsp);
        }
        if let Some(ref mut back) = self.back {
            back.clip_to(bsp);
        }
    }

    /// Swap solid and empty space
    fn invert(&mut self) {
        for poly in &mut self.polygons {
            poly.flip();
        }
        if let Some(ref mut plane) = self.plane {
            plane.flip();
        }
        if let Some(ref mut front) = self.front {
            front.invert();
        }
        if let Some(ref mut back) = self.back {
            back.invert();
        }
        std::mem::swap(&mut self.front, &mut self.back);
    }
}

/// Convert mesh to polygons, dropping degenerate triangles
fn mesh_to_polygons(mesh: &Mesh) -> Result<Vec<Polygon>> {
    let mut polygons = Vec::with_capacity(mesh.triangle_count());
    for tri in &mesh.triangles {
        let mut vertices = Vec::with_capacity(3);
        for &index in &tri.indices {
            let vertex = mesh.vertices.get(index).ok_or_else(|| {
                CutError::Boolean(format!("triangle references missing vertex {}", index))
            })?;
            if !vertex.position.coords.iter().all(|c| c.is_finite()) {
                return Err(CutError::Boolean("non-finite vertex position".into()));
            }
            vertices.push(*vertex);
        }
        if let Some(polygon) = Polygon::new(vertices) {
            polygons.push(polygon);
        }
    }
    Ok(polygons)
}

/// Convert polygons back to mesh by fan triangulation
fn polygons_to_mesh(polygons: &[Polygon]) -> Mesh {
    let mut mesh = Mesh::new();

    for poly in polygons {
        let normal = poly.plane.normal;
        let base = mesh.vertex_count();
        for v in &poly.vertices {
            mesh.add_vertex(Vertex::new(v.position, normal));
        }
        for i in 1..poly.vertices.len() - 1 {
            mesh.add_triangle(Triangle::new([base, base + i, base + i + 1]));
        }
    }

    mesh
}

fn trees(a: &Mesh, b: &Mesh) -> Result<(BspNode, BspNode)> {
    Ok((BspNode::new(mesh_to_polygons(a)?), BspNode::new(mesh_to_polygons(b)?)))
}

/// Perform CSG union using BSP trees
pub fn csg_union(a: &Mesh, b: &Mesh) -> Result<Mesh> {
    if a.is_empty() {
        return Ok(b.clone());
    }
    if b.is_empty() {
        return Ok(a.clone());
    }
    let (mut tree_a, mut tree_b) = trees(a, b)?;

    tree_a.clip_to(&tree_b);
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_a.build(tree_b.all_polygons());

    Ok(polygons_to_mesh(&tree_a.all_polygons()))
}

/// Perform CSG difference (a minus b) using BSP trees
pub fn csg_difference(a: &Mesh, b: &Mesh) -> Result<Mesh> {
    if a.is_empty() || b.is_empty() {
        return Ok(a.clone());
    }
    let (mut tree_a, mut tree_b) = trees(a, b)?;

    tree_a.invert();
    tree_a.clip_to(&tree_b);
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_a.build(tree_b.all_polygons());
    tree_a.invert();

    Ok(polygons_to_mesh(&tree_a.all_polygons()))
}

/// Perform CSG intersection using BSP trees
pub fn csg_intersection(a: &Mesh, b: &Mesh) -> Result<Mesh> {
    if a.is_empty() || b.is_empty() {
        return Ok(Mesh::empty());
    }
    let (mut tree_a, mut tree_b) = trees(a, b)?;

    tree_a.invert();
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_a.clip_to(&tree_b);
    tree_b.clip_to(&tree_a);
    tree_a.build(tree_b.all_polygons());
    tree_a.invert();

    Ok(polygons_to_mesh(&tree_a.all_polygons()))
}
