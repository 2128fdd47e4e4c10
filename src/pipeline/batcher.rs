// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Operation batching
//!
//! Congruent operations (same kind, shape and rounded rotation) are merged into
//! one combined tool so a build needs fewer boolean steps. Each member is placed
//! relative to the first member's frame, the parts are merged, and the first
//! member's placement is applied once to the merged result.

use crate::config::{PipelineConfig, MAX_BATCH_SIZE};
use crate::error::{CutError, Result};
use crate::geometry::{CsgBackend, Mesh};
use crate::ops::{Canonicalizer, CombinedOp, GroupKey, Operation, PlannedOp, POSITION_PRECISION};
use crate::utils::{euler_xyz_to_rotation, quantize};
use ahash::AHashMap;
use nalgebra::{Matrix4, Translation3};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Group key plus each member's placement relative to the first member
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MergeKey {
    group: GroupKey,
    members: Vec<[i64; 4]>,
}

/// Capacity-bound memo of merged tool meshes; evicts the oldest entry when full
#[derive(Debug, Clone)]
pub struct MergeCache {
    entries: AHashMap<MergeKey, Mesh>,
    order: VecDeque<MergeKey>,
    capacity: usize,
}

impl MergeCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: AHashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn get(&self, key: &MergeKey) -> Option<&Mesh> {
        self.entries.get(key)
    }

    fn insert(&mut self, key: MergeKey, mesh: Mesh) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.contains_key(&key) {
            self.entries.insert(key, mesh);
            return;
        }
        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, mesh);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

impl Default for MergeCache {
    fn default() -> Self {
        Self::new(50)
    }
}

/// Result of [`Batcher::plan`]
#[derive(Debug, Clone)]
pub struct BatchPlan {
    pub ops: Vec<PlannedOp>,
    /// Distinct congruence groups in the input
    pub group_count: usize,
    /// Chunks whose merge failed and fell back to single operations
    pub degraded_chunks: usize,
}

impl BatchPlan {
    pub fn combined_count(&self) -> usize {
        self.ops.iter().filter(|op| op.is_precombined()).count()
    }
}

/// Groups and merges operations ahead of evaluation
#[derive(Debug, Clone)]
pub struct Batcher {
    canonicalizer: Canonicalizer,
    batch_size: usize,
    merge_cache: MergeCache,
}

impl Batcher {
    /// `batch_size` is clamped to `1..=10`
    pub fn new(canonicalizer: Canonicalizer, batch_size: usize, merge_cache_capacity: usize) -> Self {
        Self {
            canonicalizer,
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
            merge_cache: MergeCache::new(merge_cache_capacity),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            Canonicalizer::new(config.rotation_precision, config.default_segments),
            config.batch_size,
            config.merge_cache_capacity,
        )
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn merge_cache(&self) -> &MergeCache {
        &self.merge_cache
    }

    pub fn clear_cache(&mut self) {
        self.merge_cache.clear();
    }

    /// Group operations in first-appearance order and merge each chunk.
    ///
    /// A chunk of one passes through unchanged; a chunk whose merge fails is
    /// emitted as its individual members.
    pub fn plan<B: CsgBackend>(&mut self, ops: &[Operation], backend: &B) -> BatchPlan {
        let mut index: AHashMap<GroupKey, usize> = AHashMap::new();
        let mut groups: Vec<(GroupKey, Vec<&Operation>)> = Vec::new();
        for op in ops {
            let key = self.canonicalizer.group_key(op);
            match index.get(&key) {
                Some(&i) => groups[i].1.push(op),
                None => {
                    index.insert(key, groups.len());
                    groups.push((key, vec![op]));
                }
            }
        }

        let mut planned = Vec::with_capacity(ops.len());
        let mut degraded_chunks = 0;
        for (key, members) in &groups {
            for chunk in members.chunks(self.batch_size) {
                if chunk.len() == 1 {
                    planned.push(PlannedOp::Single(*chunk[0]));
                    continue;
                }
                match self.combine(key, chunk, backend) {
                    Ok(combined) => planned.push(PlannedOp::Combined(combined)),
                    Err(e) => {
                        warn!(
                            "Merging {} operations of group {} failed, evaluating them one by one: {}",
                            chunk.len(),
                            key,
                            e
                        );
                        degraded_chunks += 1;
                        planned.extend(chunk.iter().map(|op| PlannedOp::Single(**op)));
                    }
                }
            }
        }

        debug!(
            "Batched {} operations in {} groups into {} steps",
            ops.len(),
            groups.len(),
            planned.len()
        );

        BatchPlan {
            ops: planned,
            group_count: groups.len(),
            degraded_chunks,
        }
    }

    fn combine<B: CsgBackend>(
        &mut self,
        key: &GroupKey,
        chunk: &[&Operation],
        backend: &B,
    ) -> Result<CombinedOp> {
        let anchor = chunk[0];
        let inverse = euler_xyz_to_rotation(&anchor.rotation).inverse();

        let relative: Vec<Matrix4<f64>> = chunk
            .iter()
            .map(|op| {
                let offset = inverse * (op.position - anchor.position);
                Translation3::from(offset).to_homogeneous()
                    * (inverse * euler_xyz_to_rotation(&op.rotation)).to_homogeneous()
                    * Translation3::new(0.0, op.axial_offset, 0.0).to_homogeneous()
            })
            .collect();

        let merge_key = MergeKey {
            group: *key,
            members: chunk
                .iter()
                .zip(&relative)
                .map(|(op, matrix)| {
                    [
                        quantize(matrix[(0, 3)], POSITION_PRECISION),
                        quantize(matrix[(1, 3)], POSITION_PRECISION),
                        quantize(matrix[(2, 3)], POSITION_PRECISION),
                        quantize(op.axial_offset, POSITION_PRECISION),
                    ]
                })
                .collect(),
        };

        let mesh = match self.merge_cache.get(&merge_key) {
            Some(mesh) => mesh.clone(),
            None => {
                let parts: Vec<Mesh> = chunk
                    .iter()
                    .zip(&relative)
                    .map(|(op, matrix)| {
                        op.shape
                            .to_mesh(self.canonicalizer.default_segments)
                            .transformed(matrix)
                    })
                    .collect();
                ensure_disjoint(&parts)?;
                let merged = backend.merge(&parts)?;
                if merged.is_empty() {
                    return Err(CutError::Merge(
                        "merged shape has no triangles".to_string(),
                    ));
                }
                self.merge_cache.insert(merge_key, merged.clone());
                merged
            }
        };

        Ok(CombinedOp {
            kind: anchor.kind,
            mesh,
            position: anchor.position,
            rotation: anchor.rotation,
            member_count: chunk.len(),
        })
    }
}

/// Overlapping members would make the merged tool self-intersecting
fn ensure_disjoint(parts: &[Mesh]) -> Result<()> {
    let boxes: Vec<_> = parts.iter().map(Mesh::bounding_box).collect();
    for (i, a) in boxes.iter().enumerate() {
        if let Some(j) = boxes[i + 1..].iter().position(|b| a.intersects(b, 1e-9)) {
            return Err(CutError::Merge(format!(
                "members {} and {} overlap",
                i,
                i + 1 + j
            )));
        }
    }
    Ok(())
}

impl Default for Batcher {
    fn default() -> Self {
        Self::new(Canonicalizer::default(), MAX_BATCH_SIZE, 50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BooleanOp, BspBackend};
    use crate::ops::Shape;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use std::f64::consts::PI;

    struct NoMerge;

    impl CsgBackend for NoMerge {
        fn apply(&self, target: &Mesh, _tool: &Mesh, _op: BooleanOp) -> Result<Mesh> {
            Ok(target.clone())
        }

        fn merge(&self, _parts: &[Mesh]) -> Result<Mesh> {
            Err(CutError::Merge("merge utility unavailable".into()))
        }
    }

    fn hole(x: f64, z: f64) -> Operation {
        Operation::subtract(Shape::cylinder(0.5, 1.3, 16))
            .at(Vector3::new(x, 0.0, z))
            .rotated(Vector3::new(PI, 0.0, 0.0))
    }

    fn grid(n: usize) -> Vec<Operation> {
        (0..n).map(|i| hole(i as f64 * 3.0, (i % 4) as f64 * 2.0)).collect()
    }

    #[test]
    fn test_sixteen_members_make_two_chunks() {
        let mut batcher = Batcher::default();
        let plan = batcher.plan(&grid(16), &BspBackend);

        assert_eq!(plan.group_count, 1);
        assert_eq!(plan.ops.len(), 2);
        assert_eq!(plan.combined_count(), 2);
        assert_eq!(plan.ops[0].member_count(), 10);
        assert_eq!(plan.ops[1].member_count(), 6);
    }

    #[test]
    fn test_trailing_single_passes_through() {
        let mut batcher = Batcher::default();
        let plan = batcher.plan(&grid(11), &BspBackend);

        assert_eq!(plan.ops.len(), 2);
        assert!(plan.ops[0].is_precombined());
        assert!(!plan.ops[1].is_precombined());
    }

    #[test]
    fn test_groups_keep_first_appearance_order() {
        let mut batcher = Batcher::default();
        let bar = Operation::subtract(Shape::cuboid(1.0, 1.0, 1.0));
        let ops = vec![hole(0.0, 0.0), bar, hole(5.0, 0.0), bar.at(Vector3::new(4.0, 0.0, 0.0))];
        let plan = batcher.plan(&ops, &BspBackend);

        assert_eq!(plan.group_count, 2);
        assert_eq!(plan.ops.len(), 2);
        match &plan.ops[1] {
            PlannedOp::Combined(combined) => assert_eq!(combined.position, Vector3::zeros()),
            other => panic!("expected combined box group, got {:?}", other),
        }
    }

    #[test]
    fn test_combined_tool_lands_members_in_place() {
        let mut batcher = Batcher::default();
        let ops = vec![hole(0.0, 0.0), hole(10.0, 4.0)];
        let plan = batcher.plan(&ops, &BspBackend);

        assert_eq!(plan.ops.len(), 1);
        let tool = plan.ops[0].tool_mesh(32).bounding_box();
        assert_relative_eq!(tool.max.x, 10.5, epsilon = 1e-9);
        assert_relative_eq!(tool.max.z, 4.5, epsilon = 1e-9);
        assert_relative_eq!(tool.min.x, -0.5, epsilon = 1e-9);
        assert_relative_eq!(tool.min.z, -0.5, epsilon = 1e-9);
        assert_relative_eq!(tool.max.y, 0.65, epsilon = 1e-9);
    }

    #[test]
    fn test_merge_failure_degrades_only_that_group() {
        let mut batcher = Batcher::default();
        let plan = batcher.plan(&grid(4), &NoMerge);

        assert_eq!(plan.degraded_chunks, 1);
        assert_eq!(plan.ops.len(), 4);
        assert!(plan.ops.iter().all(|op| !op.is_precombined()));
    }

    #[test]
    fn test_overlapping_members_are_not_merged() {
        let mut batcher = Batcher::default();
        let ops = vec![hole(0.0, 0.0), hole(0.6, 0.0), hole(10.0, 0.0), hole(20.0, 0.0)];
        let plan = batcher.plan(&ops, &BspBackend);

        assert_eq!(plan.degraded_chunks, 1);
        assert_eq!(plan.ops.len(), 4);
        assert!(batcher.merge_cache().is_empty());

        // Touching members are still merged
        let plan = batcher.plan(&[hole(0.0, 0.0), hole(1.0, 0.0)], &BspBackend);
        assert_eq!(plan.combined_count(), 1);
    }

    #[test]
    fn test_batch_size_one_disables_merging() {
        let mut batcher = Batcher::new(Canonicalizer::default(), 1, 50);
        let plan = batcher.plan(&grid(5), &BspBackend);
        assert_eq!(plan.ops.len(), 5);
        assert!(batcher.merge_cache().is_empty());
    }

    #[test]
    fn test_batch_size_is_clamped() {
        assert_eq!(Batcher::new(Canonicalizer::default(), 0, 50).batch_size(), 1);
        assert_eq!(Batcher::new(Canonicalizer::default(), 25, 50).batch_size(), 10);
    }

    #[test]
    fn test_merge_cache_evicts_oldest() {
        let mut batcher = Batcher::new(Canonicalizer::default(), 2, 2);
        assert_eq!(batcher.merge_cache().capacity(), 2);
        for spacing in [1.5, 2.0, 3.0] {
            let ops = vec![hole(0.0, 0.0), hole(spacing, 0.0)];
            batcher.plan(&ops, &BspBackend);
        }
        assert_eq!(batcher.merge_cache().len(), 2);

        // Same relative layout, different absolute position: served from cache
        let shifted = vec![hole(50.0, 0.0), hole(53.0, 0.0)];
        batcher.plan(&shifted, &BspBackend);
        assert_eq!(batcher.merge_cache().len(), 2);
    }
}
