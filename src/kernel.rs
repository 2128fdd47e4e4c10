// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel API: builds element geometry and outlines

use crate::config::PipelineConfig;
use crate::geometry::{BspBackend, CsgBackend, Mesh};
use crate::ops::{CacheKey, Canonicalizer, ElementDefinition, ElementGeometry, HoleBuilder, LoadReport};
use crate::pipeline::{BatchPlan, Batcher, BooleanEvaluator, Evaluation, ResultCache};
use crate::profiler::{DebugInfo, Profiler, Timer};
use crate::wireframe::{OutlineLoop, WireframeReconstructor};
use nalgebra::Vector3;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// How a build produced its mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BuildStatus {
    /// Served from the result cache
    Cached,
    /// Every operation applied
    Built,
    /// Some operations failed and are missing from the mesh
    Partial { failed: usize },
    /// CSG unavailable; the mesh is the unmodified base
    Disabled,
}

/// Mesh plus how it was produced
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub mesh: Mesh,
    pub status: BuildStatus,
    /// Fingerprint of the cache key
    pub fingerprint: String,
    /// Boolean steps after batching; zero for cached and disabled builds
    pub steps: usize,
    pub elapsed: Duration,
}

/// Main kernel; owns every pipeline component
pub struct Kernel<B: CsgBackend = BspBackend> {
    config: PipelineConfig,
    canonicalizer: Canonicalizer,
    builder: HoleBuilder,
    batcher: Batcher,
    evaluator: BooleanEvaluator<B>,
    cache: ResultCache,
    profiler: Profiler,
    wireframe: WireframeReconstructor,
}

impl Kernel<BspBackend> {
    /// Create a kernel with the built-in BSP backend
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_backend(config, BspBackend)
    }
}

impl Default for Kernel<BspBackend> {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl<B: CsgBackend> Kernel<B> {
    pub fn with_backend(config: PipelineConfig, backend: B) -> Self {
        Self {
            canonicalizer: Canonicalizer::new(config.rotation_precision, config.default_segments),
            builder: HoleBuilder::from_config(&config),
            batcher: Batcher::from_config(&config),
            evaluator: BooleanEvaluator::with_settings(
                backend,
                config.default_segments,
                config.weld_epsilon,
            ),
            cache: ResultCache::new(config.cache_max_age()),
            profiler: Profiler::new(
                config.profiler_capacity,
                config.profiler_retain,
                config.slow_build_threshold(),
            ),
            wireframe: WireframeReconstructor::from_config(&config),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn hole_builder(&self) -> &HoleBuilder {
        &self.builder
    }

    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    /// Runs the backend self-test on first call
    pub fn csg_available(&self) -> bool {
        self.evaluator.is_available()
    }

    /// Turn a declarative definition into operation descriptors
    pub fn load(&self, definition: &ElementDefinition) -> LoadReport {
        definition.to_geometry(&self.builder, &self.config)
    }

    pub fn cache_key(&self, element: &ElementGeometry) -> CacheKey {
        self.canonicalizer.cache_key(&element.base, &element.operations)
    }

    /// Batch an element's operations without evaluating them
    pub fn plan(&mut self, element: &ElementGeometry) -> BatchPlan {
        self.batcher.plan(&element.operations, self.evaluator.backend())
    }

    /// Build an element's final mesh.
    ///
    /// Only complete builds are cached. Failures never escape: a disabled
    /// backend yields the base mesh and failed operations are left out.
    pub fn build(&mut self, element: &ElementGeometry) -> BuildOutcome {
        let timer = Timer::start();
        let key = self.cache_key(element);
        let fingerprint = key.fingerprint();

        if let Some(mesh) = self.cache.get(&key) {
            debug!("Cache hit for {}", fingerprint);
            return BuildOutcome {
                mesh,
                status: BuildStatus::Cached,
                fingerprint,
                steps: 0,
                elapsed: timer.elapsed(),
            };
        }

        let base = element.base.to_mesh(self.config.default_segments);
        if !self.evaluator.is_available() {
            return BuildOutcome {
                mesh: base,
                status: BuildStatus::Disabled,
                fingerprint,
                steps: 0,
                elapsed: timer.elapsed(),
            };
        }

        let plan = self.batcher.plan(&element.operations, self.evaluator.backend());
        let steps = plan.ops.len();
        let evaluation = self.evaluator.evaluate(&base, &plan.ops);
        let elapsed = timer.elapsed();

        let (mesh, status) = match evaluation {
            Evaluation::Complete(mesh) => {
                let purged = self.cache.purge_expired();
                if purged > 0 {
                    debug!("Purged {} expired results", purged);
                }
                self.cache.set(key, &mesh, elapsed);
                (mesh, BuildStatus::Built)
            }
            Evaluation::Partial { mesh, failures } => (
                mesh,
                BuildStatus::Partial {
                    failed: failures.len(),
                },
            ),
            Evaluation::Disabled(mesh) => (mesh, BuildStatus::Disabled),
        };

        self.profiler
            .record(fingerprint.as_str(), elapsed, element.operations.len());
        info!(
            "Built {} in {:.2} ms: {} operations in {} steps, {} triangles",
            fingerprint,
            elapsed.as_secs_f64() * 1000.0,
            element.operations.len(),
            steps,
            mesh.triangle_count()
        );

        BuildOutcome {
            mesh,
            status,
            fingerprint,
            steps,
            elapsed,
        }
    }

    /// Schematic outlines of the element's subtractive operations
    pub fn outlines(
        &self,
        element_id: &str,
        element: &ElementGeometry,
        context: Option<&Vector3<f64>>,
        distance: Option<f64>,
    ) -> Vec<OutlineLoop> {
        self.wireframe
            .element_outlines(element_id, element, context, distance)
    }

    /// Drop cached results and merged tool shapes
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.batcher.clear_cache();
    }

    pub fn debug_info(&self) -> DebugInfo {
        DebugInfo {
            csg_available: self.evaluator.is_available(),
            cache_size: self.cache.len(),
            total_operations: self.profiler.len(),
            average_time: self.profiler.average_ms(),
            slow_operations: self.profiler.slow_builds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{Axis, HoleSpec, Shape};

    fn plate(kernel: &Kernel) -> ElementGeometry {
        let mut element = ElementGeometry::new(Shape::cuboid(20.0, 1.0, 20.0));
        for x in [-5.0, 0.0, 5.0] {
            let op = kernel
                .hole_builder()
                .single_hole(&HoleSpec::new(1.0, Axis::Y).segments(12), Vector3::new(x, 0.0, 0.0), 1.0)
                .unwrap();
            element.push(op);
        }
        element
    }

    #[test]
    fn test_build_then_cache_hit() {
        let mut kernel = Kernel::default();
        let element = plate(&kernel);

        let first = kernel.build(&element);
        assert_eq!(first.status, BuildStatus::Built);
        assert_eq!(first.steps, 1);

        let second = kernel.build(&element);
        assert_eq!(second.status, BuildStatus::Cached);
        assert_eq!(second.fingerprint, first.fingerprint);
        assert_eq!(second.mesh.triangle_count(), first.mesh.triangle_count());

        let info = kernel.debug_info();
        assert!(info.csg_available);
        assert!(kernel.csg_available());
        assert_eq!(info.cache_size, 1);
        assert_eq!(info.total_operations, 1);
        assert_eq!(kernel.profiler().records().count(), 1);
    }

    #[test]
    fn test_unvalidated_slow_threshold_does_not_panic() {
        let mut kernel = Kernel::new(PipelineConfig {
            slow_build_ms: f64::INFINITY,
            ..PipelineConfig::default()
        });
        let element = plate(&kernel);

        assert_eq!(kernel.profiler().slow_threshold(), Duration::MAX);
        assert_eq!(kernel.build(&element).status, BuildStatus::Built);
        assert_eq!(kernel.debug_info().slow_operations, 0);
    }

    #[test]
    fn test_clear_cache_forces_rebuild() {
        let mut kernel = Kernel::default();
        let element = plate(&kernel);
        kernel.build(&element);
        kernel.clear_cache();

        assert_eq!(kernel.debug_info().cache_size, 0);
        assert_eq!(kernel.build(&element).status, BuildStatus::Built);
    }

    #[test]
    fn test_outlines_cover_every_hole() {
        let kernel = Kernel::default();
        let element = plate(&kernel);
        let loops = kernel.outlines("plate", &element, None, None);

        assert_eq!(loops.len(), 6);
        assert_eq!(loops[4].key, "plate_hole_2_top");
    }
}
