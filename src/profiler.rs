// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Build timing collection and debug reporting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::warn;

/// Timer for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }
}

/// One profiled build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRecord {
    /// Fingerprint of the build's cache key
    pub cache_key: String,
    pub elapsed: Duration,
    pub operation_count: usize,
    pub timestamp: DateTime<Utc>,
}

impl BuildRecord {
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}

/// Bounded log of build timings.
///
/// Once more than `capacity` records are held, only the newest `retain` are kept.
#[derive(Debug, Clone)]
pub struct Profiler {
    records: VecDeque<BuildRecord>,
    capacity: usize,
    retain: usize,
    slow_threshold: Duration,
}

impl Profiler {
    pub fn new(capacity: usize, retain: usize, slow_threshold: Duration) -> Self {
        Self {
            records: VecDeque::new(),
            capacity,
            retain: retain.min(capacity),
            slow_threshold,
        }
    }

    pub fn record(&mut self, cache_key: impl Into<String>, elapsed: Duration, operation_count: usize) {
        let record = BuildRecord {
            cache_key: cache_key.into(),
            elapsed,
            operation_count,
            timestamp: Utc::now(),
        };
        if elapsed > self.slow_threshold {
            warn!(
                "Slow build {}: {:.2} ms for {} operations",
                record.cache_key,
                record.elapsed_ms(),
                operation_count
            );
        }

        self.records.push_back(record);
        if self.records.len() > self.capacity {
            let excess = self.records.len() - self.retain;
            self.records.drain(..excess);
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &BuildRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mean build time in milliseconds; zero when nothing was recorded
    pub fn average_ms(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let total: f64 = self.records.iter().map(BuildRecord::elapsed_ms).sum();
        total / self.records.len() as f64
    }

    pub fn slow_builds(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.elapsed > self.slow_threshold)
            .count()
    }

    pub fn slow_threshold(&self) -> Duration {
        self.slow_threshold
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new(1000, 500, Duration::from_millis(100))
    }
}

/// Informational snapshot of a kernel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub csg_available: bool,
    pub cache_size: usize,
    /// Builds currently held by the profiler
    pub total_operations: usize,
    /// Milliseconds
    pub average_time: f64,
    pub slow_operations: usize,
}

/// Estimate memory usage for a mesh in KB
pub fn estimate_mesh_memory(vertex_count: usize, triangle_count: usize) -> usize {
    // Position and normal as f64 triples, three usize indices per triangle
    let vertex_bytes = vertex_count * 48;
    let triangle_bytes = triangle_count * 24;
    (vertex_bytes + triangle_bytes) / 1024
}
