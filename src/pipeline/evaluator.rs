// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Sequential boolean evaluation against a running result

use crate::error::CutError;
use crate::geometry::{BooleanOp, BspBackend, CsgBackend, Mesh, Primitive, DEFAULT_SEGMENTS};
use crate::ops::PlannedOp;
use std::cell::OnceCell;
use tracing::{debug, error, warn};

/// One operation the backend rejected
#[derive(Debug, Clone, PartialEq)]
pub struct OpFailure {
    /// Position in the planned operation list
    pub index: usize,
    pub kind: BooleanOp,
    pub member_count: usize,
    pub error: CutError,
}

/// Outcome of [`BooleanEvaluator::evaluate`]
#[derive(Debug, Clone)]
pub enum Evaluation {
    /// Every operation applied
    Complete(Mesh),
    /// Some operations were skipped; their cuts are missing from `mesh`
    Partial { mesh: Mesh, failures: Vec<OpFailure> },
    /// Self-test failed; the base geometry is returned unmodified
    Disabled(Mesh),
}

impl Evaluation {
    pub fn mesh(&self) -> &Mesh {
        match self {
            Evaluation::Complete(mesh)
            | Evaluation::Partial { mesh, .. }
            | Evaluation::Disabled(mesh) => mesh,
        }
    }

    pub fn failures(&self) -> &[OpFailure] {
        match self {
            Evaluation::Partial { failures, .. } => failures,
            _ => &[],
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Evaluation::Disabled(_))
    }
}

/// Applies planned operations in order with a [`CsgBackend`].
///
/// Availability is decided once per evaluator by a synthetic self-test on first
/// use and never re-checked.
#[derive(Debug)]
pub struct BooleanEvaluator<B: CsgBackend = BspBackend> {
    backend: B,
    available: OnceCell<bool>,
    default_segments: u32,
    weld_epsilon: f64,
}

impl<B: CsgBackend> BooleanEvaluator<B> {
    pub fn new(backend: B) -> Self {
        Self::with_settings(backend, DEFAULT_SEGMENTS, 1e-5)
    }

    pub fn with_settings(backend: B, default_segments: u32, weld_epsilon: f64) -> Self {
        Self {
            backend,
            available: OnceCell::new(),
            default_segments,
            weld_epsilon,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Runs the self-test on first call
    pub fn is_available(&self) -> bool {
        *self.available.get_or_init(|| self.self_test())
    }

    fn self_test(&self) -> bool {
        let outer = Primitive::cuboid(2.0, 2.0, 2.0).to_mesh();
        let inner = Primitive::cuboid(1.0, 1.0, 1.0).to_mesh();
        match self.backend.apply(&outer, &inner, BooleanOp::Subtract) {
            Ok(mesh) if !mesh.is_empty() => {
                debug!("CSG self-test passed ({} triangles)", mesh.triangle_count());
                true
            }
            Ok(_) => {
                error!("CSG self-test produced an empty result, boolean operations disabled");
                false
            }
            Err(e) => {
                error!("CSG self-test failed, boolean operations disabled: {}", e);
                false
            }
        }
    }

    /// Apply `ops` to a copy of `base`, then simplify the result
    pub fn evaluate(&self, base: &Mesh, ops: &[PlannedOp]) -> Evaluation {
        if !self.is_available() {
            debug!("CSG disabled, returning base geometry");
            return Evaluation::Disabled(base.clone());
        }

        let mut running = base.clone();
        let mut failures = Vec::new();
        for (index, op) in ops.iter().enumerate() {
            let tool = op.tool_mesh(self.default_segments);
            match self.backend.apply(&running, &tool, op.kind()) {
                Ok(mesh) => running = mesh,
                Err(e) => {
                    warn!(
                        "Skipping {} operation {} ({} member(s)): {}",
                        op.kind(),
                        index,
                        op.member_count(),
                        e
                    );
                    failures.push(OpFailure {
                        index,
                        kind: op.kind(),
                        member_count: op.member_count(),
                        error: e,
                    });
                }
            }
        }

        let report = running.simplify(self.weld_epsilon);
        debug!(
            "Evaluated {} operations: welded {}, removed {} triangles, dropped {} vertices",
            ops.len(),
            report.welded_vertices,
            report.removed_triangles,
            report.orphaned_vertices
        );

        if failures.is_empty() {
            Evaluation::Complete(running)
        } else {
            Evaluation::Partial {
                mesh: running,
                failures,
            }
        }
    }
}

impl Default for BooleanEvaluator<BspBackend> {
    fn default() -> Self {
        Self::new(BspBackend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::geometry::mesh_utils::signed_volume;
    use crate::ops::{Operation, Shape};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use std::cell::Cell;

    struct Broken {
        calls: Cell<usize>,
    }

    impl CsgBackend for Broken {
        fn apply(&self, _target: &Mesh, _tool: &Mesh, _op: BooleanOp) -> Result<Mesh> {
            self.calls.set(self.calls.get() + 1);
            Err(CutError::BackendUnavailable("no engine".into()))
        }
    }

    /// Fails on tools wider than a threshold, otherwise delegates to BSP
    struct Picky;

    impl CsgBackend for Picky {
        fn apply(&self, target: &Mesh, tool: &Mesh, op: BooleanOp) -> Result<Mesh> {
            if tool.bounding_box().size().x > 1.5 {
                return Err(CutError::Boolean("tool too wide".into()));
            }
            BspBackend.apply(target, tool, op)
        }
    }

    fn slab() -> Mesh {
        Primitive::cuboid(10.0, 1.0, 10.0).to_mesh()
    }

    fn through_hole(x: f64, width: f64) -> PlannedOp {
        PlannedOp::Single(Operation::subtract(Shape::cuboid(width, 2.0, 1.0)).at(Vector3::new(x, 0.0, 0.0)))
    }

    #[test]
    fn test_complete_evaluation_removes_volume() {
        let evaluator = BooleanEvaluator::default();
        let result = evaluator.evaluate(&slab(), &[through_hole(0.0, 1.0), through_hole(3.0, 1.0)]);

        assert!(matches!(result, Evaluation::Complete(_)));
        assert_relative_eq!(signed_volume(result.mesh()), 98.0, epsilon = 1e-6);
        assert!(result.mesh().bounding_volumes().is_some());
    }

    #[test]
    fn test_failed_operation_is_skipped() {
        let evaluator = BooleanEvaluator::new(Picky);
        let result = evaluator.evaluate(&slab(), &[through_hole(-3.0, 2.0), through_hole(3.0, 1.0)]);

        assert_eq!(result.failures().len(), 1);
        assert_eq!(result.failures()[0].index, 0);
        // Only the narrow hole was cut
        assert_relative_eq!(signed_volume(result.mesh()), 99.0, epsilon = 1e-6);
    }

    #[test]
    fn test_self_test_failure_disables_once() {
        let evaluator = BooleanEvaluator::new(Broken {
            calls: Cell::new(0),
        });
        let base = slab();

        for _ in 0..3 {
            let result = evaluator.evaluate(&base, &[through_hole(0.0, 1.0)]);
            assert!(result.is_disabled());
            assert_eq!(result.mesh().triangle_count(), base.triangle_count());
        }
        assert!(!evaluator.is_available());
        assert_eq!(evaluator.backend().calls.get(), 1);
    }
}
