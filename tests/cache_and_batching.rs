// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Batching invariance, result caching and key stability

use approx::assert_relative_eq;
use cutwork::geometry::mesh_utils::signed_volume;
use cutwork::ops::{Canonicalizer, HoleSpec};
use cutwork::pipeline::Batcher;
use cutwork::{
    Axis, BooleanOp, BspBackend, BuildStatus, CsgBackend, CutError, ElementGeometry, Kernel, Mesh,
    Operation, PipelineConfig, Result, Shape,
};
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn drilled_plate(config: &PipelineConfig, count: usize) -> ElementGeometry {
    let kernel = Kernel::new(config.clone());
    let spec = HoleSpec::new(0.75, Axis::Y).segments(10);
    let ops = (0..count)
        .map(|i| {
            let position = Vector3::new(-20.0 + 4.0 * i as f64, 0.0, if i % 2 == 0 { -3.0 } else { 3.0 });
            kernel.hole_builder().single_hole(&spec, position, 1.0).unwrap()
        })
        .collect();
    ElementGeometry::with_operations(Shape::cuboid(50.0, 1.0, 12.0), ops)
}

#[test]
fn chunk_size_does_not_change_the_tools() {
    let config = PipelineConfig::default();
    let element = drilled_plate(&config, 12);

    let mut reference: Option<(usize, cutwork::geometry::BoundingBox)> = None;
    for batch_size in [1, 2, 3, 5, 10] {
        let mut batcher = Batcher::new(Canonicalizer::default(), batch_size, 50);
        let plan = batcher.plan(&element.operations, &BspBackend);
        assert_eq!(plan.ops.len(), 12usize.div_ceil(batch_size));

        let mut tools = Mesh::new();
        for op in &plan.ops {
            tools.merge(&op.tool_mesh(32));
        }
        let summary = (tools.vertex_count(), tools.bounding_box());
        match &reference {
            None => reference = Some(summary),
            Some((vertices, bbox)) => {
                assert_eq!(summary.0, *vertices, "batch size {}", batch_size);
                assert!(summary.1.approx_eq(bbox, 1e-9), "batch size {}", batch_size);
            }
        }
    }
}

#[test]
fn chunk_size_does_not_change_the_result() {
    let mut volumes = Vec::new();
    let mut boxes = Vec::new();
    for batch_size in [1, 4, 10] {
        let config = PipelineConfig {
            batch_size,
            ..PipelineConfig::default()
        };
        let mut kernel = Kernel::new(config.clone());
        let outcome = kernel.build(&drilled_plate(&config, 12));
        assert_eq!(outcome.status, BuildStatus::Built);
        volumes.push(signed_volume(&outcome.mesh));
        boxes.push(outcome.mesh.bounding_box());
    }

    for (volume, bbox) in volumes.iter().zip(&boxes).skip(1) {
        assert_relative_eq!(*volume, volumes[0], epsilon = 1e-6);
        assert!(bbox.approx_eq(&boxes[0], 1e-9));
    }
}

#[test]
fn overlapping_holes_give_the_same_result_at_any_chunk_size() {
    let mut results = Vec::new();
    for batch_size in [1, 10] {
        let config = PipelineConfig {
            batch_size,
            ..PipelineConfig::default()
        };
        let mut kernel = Kernel::new(config);
        let spec = HoleSpec::new(1.0, Axis::Y).segments(16);
        let ops = [0.0, 1.2, 2.4]
            .into_iter()
            .map(|x| {
                kernel
                    .hole_builder()
                    .single_hole(&spec, Vector3::new(x, 0.0, 0.0), 1.0)
                    .unwrap()
            })
            .collect();
        let element = ElementGeometry::with_operations(Shape::cuboid(20.0, 1.0, 20.0), ops);

        let outcome = kernel.build(&element);
        assert_eq!(outcome.status, BuildStatus::Built);
        assert_eq!(outcome.steps, 3);
        results.push((signed_volume(&outcome.mesh), outcome.mesh.bounding_box()));
    }

    assert_relative_eq!(results[0].0, results[1].0, epsilon = 1e-9);
    assert!(results[0].1.approx_eq(&results[1].1, 1e-12));
    assert!(results[0].0 < 400.0 - 1.0);
}

#[test]
fn cached_result_matches_fresh_build() {
    let config = PipelineConfig::default();
    let element = drilled_plate(&config, 4);

    let mut kernel = Kernel::new(config.clone());
    let built = kernel.build(&element);
    let cached = kernel.build(&element);
    assert_eq!(built.status, BuildStatus::Built);
    assert_eq!(cached.status, BuildStatus::Cached);

    let fresh = Kernel::new(config).build(&element);
    assert!(cached
        .mesh
        .bounding_box()
        .approx_eq(&fresh.mesh.bounding_box(), 1e-12));
    assert_eq!(cached.mesh.triangle_count(), fresh.mesh.triangle_count());
}

#[test]
fn expired_result_is_rebuilt() {
    let config = PipelineConfig {
        cache_max_age_secs: 0,
        ..PipelineConfig::default()
    };
    let element = drilled_plate(&config, 2);
    let mut kernel = Kernel::new(config);

    assert_eq!(kernel.build(&element).status, BuildStatus::Built);
    assert_eq!(kernel.build(&element).status, BuildStatus::Built);
    assert_eq!(kernel.debug_info().total_operations, 2);
}

#[test]
fn keys_are_deterministic() {
    let config = PipelineConfig::default();
    let kernel = Kernel::new(config.clone());
    let element = drilled_plate(&config, 3);

    assert_eq!(kernel.cache_key(&element), kernel.cache_key(&element.clone()));
    assert_eq!(
        kernel.cache_key(&element).fingerprint(),
        kernel.cache_key(&drilled_plate(&config, 3)).fingerprint()
    );
    assert_ne!(kernel.cache_key(&element), kernel.cache_key(&drilled_plate(&config, 4)));
}

#[test]
fn rotation_jitter_keeps_keys_stable() {
    let config = PipelineConfig::default();
    let kernel = Kernel::new(config.clone());
    let element = drilled_plate(&config, 6);
    let key = kernel.cache_key(&element);

    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..100 {
        let mut jittered = element.clone();
        for op in &mut jittered.operations {
            op.rotation += Vector3::new(
                rng.gen_range(-1e-6..1e-6),
                rng.gen_range(-1e-6..1e-6),
                rng.gen_range(-1e-6..1e-6),
            );
        }
        assert_eq!(kernel.cache_key(&jittered), key);
    }

    let mut rotated = element.clone();
    rotated.operations[0].rotation.z += 0.01;
    assert_ne!(kernel.cache_key(&rotated), key);
}

#[test]
fn jittered_members_still_batch_together() {
    let config = PipelineConfig::default();
    let mut element = drilled_plate(&config, 8);
    let mut rng = StdRng::seed_from_u64(42);
    for op in &mut element.operations {
        op.rotation.x += rng.gen_range(-1e-6..1e-6);
    }

    let mut kernel = Kernel::new(config);
    let plan = kernel.plan(&element);
    assert_eq!(plan.group_count, 1);
    assert_eq!(plan.ops.len(), 1);
}

/// BSP booleans, but merging always fails
struct MergeUnavailable;

impl CsgBackend for MergeUnavailable {
    fn apply(&self, target: &Mesh, tool: &Mesh, op: BooleanOp) -> Result<Mesh> {
        BspBackend.apply(target, tool, op)
    }

    fn merge(&self, _parts: &[Mesh]) -> Result<Mesh> {
        Err(CutError::Merge("no merge utility".into()))
    }
}

#[test]
fn merge_failure_degrades_to_single_operations() {
    let config = PipelineConfig::default();
    let mut element = drilled_plate(&config, 3);
    element.push(Operation::new(BooleanOp::Subtract, Shape::sphere(0.5, 8)).at(Vector3::new(20.0, 0.5, 0.0)));

    let mut kernel = Kernel::with_backend(config.clone(), MergeUnavailable);
    let outcome = kernel.build(&element);
    assert_eq!(outcome.status, BuildStatus::Built);
    assert_eq!(outcome.steps, 4);

    let reference = Kernel::new(config).build(&element);
    assert_relative_eq!(
        signed_volume(&outcome.mesh),
        signed_volume(&reference.mesh),
        epsilon = 1e-6
    );
}
