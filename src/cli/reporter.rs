// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use super::runner::{BuildRun, Inspection, OutlineRun};
use crate::kernel::BuildStatus;
use crate::profiler::{estimate_mesh_memory, DebugInfo};
use colored::*;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Report one element build
    pub fn report_build(run: &BuildRun) {
        let outcome = &run.outcome;
        println!("\n{}", "━".repeat(80).bright_black());
        println!(
            "{} {} {}",
            "Element:".bold(),
            run.id.cyan(),
            format!("[{}]", outcome.fingerprint).bright_black()
        );
        println!("{}", "━".repeat(80).bright_black());

        match outcome.status {
            BuildStatus::Built => println!("{} {}", "✅".green(), "Built".green().bold()),
            BuildStatus::Cached => println!("{} {}", "✅".green(), "Served from cache".green()),
            BuildStatus::Partial { failed } => println!(
                "{} {}",
                "⚠️".yellow(),
                format!("Partial: {} operation(s) failed", failed).yellow().bold()
            ),
            BuildStatus::Disabled => println!(
                "{} {}",
                "❌".red(),
                "CSG unavailable, base geometry returned".red().bold()
            ),
        }

        println!(
            "  {} {}",
            "Vertices:".bright_black(),
            outcome.mesh.vertex_count().to_string().cyan()
        );
        println!(
            "  {} {}",
            "Triangles:".bright_black(),
            outcome.mesh.triangle_count().to_string().cyan()
        );
        println!(
            "  {} {}",
            "Boolean steps:".bright_black(),
            outcome.steps.to_string().cyan()
        );
        println!(
            "  {} {}",
            "Time:".bright_black(),
            Self::format_duration(outcome.elapsed).yellow()
        );

        for skipped in &run.skipped {
            Self::report_warning(&format!("skipped: {}", skipped));
        }
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report outline loops of one element
    pub fn report_outlines(run: &OutlineRun) {
        println!("\n{} {}", "Outlines:".bold(), run.id.cyan());
        for outline in &run.loops {
            let p = &outline.position;
            println!(
                "  {:<32} {} {:<8} {} ({:.3}, {:.3}, {:.3}) {} {}",
                outline.key.cyan(),
                "axis".bright_black(),
                format!("{}/{}", outline.axis, outline.direction),
                "at".bright_black(),
                p.x,
                p.y,
                p.z,
                "points".bright_black(),
                outline.points.len()
            );
        }
    }

    /// Report planning and mesh statistics
    pub fn report_inspection(inspection: &Inspection) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!(
            "{} {} {}",
            "Inspect:".bold(),
            inspection.id.cyan(),
            format!("[{}]", inspection.fingerprint).bright_black()
        );
        println!("{}", "━".repeat(80).bright_black());

        println!("\n{}", "Plan:".bold());
        Self::print_value("Operations", inspection.operation_count);
        Self::print_value("Groups", inspection.group_count);
        Self::print_value("Boolean steps", inspection.steps);
        Self::print_value("Combined steps", inspection.combined_steps);
        Self::print_value("Skipped entries", inspection.skipped.len());

        println!("\n{}", "Mesh:".bold());
        Self::print_value("Vertices", inspection.vertex_count);
        Self::print_value("Triangles", inspection.triangle_count);
        Self::print_value(
            "Memory (KB)",
            estimate_mesh_memory(inspection.vertex_count, inspection.triangle_count),
        );
        let size = inspection.bbox.size();
        println!(
            "  {} {:.3} x {:.3} x {:.3}",
            "Size:".bright_black(),
            size.x,
            size.y,
            size.z
        );

        let validation = &inspection.validation;
        let closed = if validation.is_closed {
            "closed".green()
        } else {
            format!("{} boundary edges", validation.boundary_edge_count).yellow()
        };
        let manifold = if validation.is_manifold {
            "manifold".green()
        } else {
            "non-manifold".red()
        };
        println!("  {} {}, {}", "Topology:".bright_black(), closed, manifold);
        println!(
            "  {} {:.4}",
            "Volume:".bright_black(),
            validation.signed_volume
        );
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report kernel debug information
    pub fn report_debug(info: &DebugInfo) {
        println!("\n{}", "Kernel:".bold());
        let csg = if info.csg_available {
            "available".green()
        } else {
            "disabled".red()
        };
        println!("  {} {}", "CSG:".bright_black(), csg);
        Self::print_value("Cached results", info.cache_size);
        Self::print_value("Profiled builds", info.total_operations);
        println!(
            "  {} {}",
            "Average build:".bright_black(),
            format!("{:.2}ms", info.average_time).yellow()
        );
        let slow = if info.slow_operations > 0 {
            info.slow_operations.to_string().red()
        } else {
            info.slow_operations.to_string().green()
        };
        println!("  {} {}", "Slow builds:".bright_black(), slow);
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        println!("{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    fn print_value(name: &str, value: usize) {
        println!(
            "  {} {}",
            format!("{}:", name).bright_black(),
            value.to_string().cyan()
        );
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }
}
