// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Element file runner for the CLI

use crate::config::PipelineConfig;
use crate::error::CutError;
use crate::geometry::mesh_utils::{validate_mesh, MeshValidation};
use crate::geometry::BoundingBox;
use crate::kernel::{BuildOutcome, Kernel};
use crate::ops::{load_elements, ElementDefinition, ElementGeometry};
use crate::wireframe::OutlineLoop;
use anyhow::Result;
use nalgebra::Vector3;
use std::path::Path;

/// One element built from a file
pub struct BuildRun {
    pub id: String,
    pub outcome: BuildOutcome,
    pub skipped: Vec<CutError>,
}

/// Outlines of one element
pub struct OutlineRun {
    pub id: String,
    pub loops: Vec<OutlineLoop>,
}

/// Planning and mesh statistics for one element
pub struct Inspection {
    pub id: String,
    pub fingerprint: String,
    pub operation_count: usize,
    pub group_count: usize,
    pub steps: usize,
    pub combined_steps: usize,
    pub skipped: Vec<CutError>,
    pub validation: MeshValidation,
    pub bbox: BoundingBox,
    pub vertex_count: usize,
    pub triangle_count: usize,
}

/// Runs element files through a kernel
pub struct Runner {
    kernel: Kernel,
}

impl Runner {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            kernel: Kernel::new(config),
        }
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    fn load(&self, path: &Path) -> Result<Vec<(ElementDefinition, ElementGeometry, Vec<CutError>)>> {
        Ok(load_elements(path)?
            .into_iter()
            .map(|definition| {
                let report = self.kernel.load(&definition);
                (definition, report.geometry, report.skipped)
            })
            .collect())
    }

    pub fn build_file(&mut self, path: &Path) -> Result<Vec<BuildRun>> {
        let elements = self.load(path)?;
        Ok(elements
            .into_iter()
            .map(|(definition, geometry, skipped)| BuildRun {
                id: definition.id,
                outcome: self.kernel.build(&geometry),
                skipped,
            })
            .collect())
    }

    pub fn outline_file(
        &self,
        path: &Path,
        context: Option<&Vector3<f64>>,
        distance: Option<f64>,
    ) -> Result<Vec<OutlineRun>> {
        let elements = self.load(path)?;
        Ok(elements
            .into_iter()
            .map(|(definition, geometry, _)| OutlineRun {
                loops: self
                    .kernel
                    .outlines(&definition.id, &geometry, context, distance),
                id: definition.id,
            })
            .collect())
    }

    pub fn inspect_file(&mut self, path: &Path) -> Result<Vec<Inspection>> {
        let elements = self.load(path)?;
        let mut inspections = Vec::with_capacity(elements.len());
        for (definition, geometry, skipped) in elements {
            let plan = self.kernel.plan(&geometry);
            let outcome = self.kernel.build(&geometry);
            inspections.push(Inspection {
                id: definition.id,
                fingerprint: outcome.fingerprint,
                operation_count: geometry.operations.len(),
                group_count: plan.group_count,
                steps: plan.ops.len(),
                combined_steps: plan.combined_count(),
                skipped,
                validation: validate_mesh(&outcome.mesh),
                bbox: outcome.mesh.bounding_box(),
                vertex_count: outcome.mesh.vertex_count(),
                triangle_count: outcome.mesh.triangle_count(),
            });
        }
        Ok(inspections)
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::BuildStatus;
    use tempfile::TempDir;

    const BRACKET: &str = r#"{
        "id": "bracket",
        "base": {"primitive": "box", "width": 40.0, "height": 2.0, "length": 20.0},
        "holes": [
            {"type": "grid", "radius": 1.5, "axis": "y", "rows": 1, "cols": 3,
             "spacing": [12.0, 0.0], "margin": [8.0, 10.0], "segments": 12}
        ]
    }"#;

    #[test]
    fn test_build_and_inspect_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bracket.json");
        std::fs::write(&path, BRACKET).unwrap();

        let mut runner = Runner::default();
        let runs = runner.build_file(&path).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].outcome.status, BuildStatus::Built);

        let inspections = runner.inspect_file(&path).unwrap();
        assert_eq!(inspections[0].operation_count, 3);
        assert_eq!(inspections[0].steps, 1);
        assert_eq!(inspections[0].combined_steps, 1);
        assert!(inspections[0].skipped.is_empty());
    }

    #[test]
    fn test_outline_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bracket.json");
        std::fs::write(&path, BRACKET).unwrap();

        let runs = Runner::default().outline_file(&path, None, None).unwrap();
        assert_eq!(runs[0].loops.len(), 6);
        assert_eq!(runs[0].loops[0].key, "bracket_hole_0_top");
    }
}
