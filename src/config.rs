// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Pipeline configuration

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Largest sub-batch the batcher may combine into a single boolean step
pub const MAX_BATCH_SIZE: usize = 10;

/// Config file looked up by [`PipelineConfig::load`]
pub const DEFAULT_CONFIG_FILE: &str = "cutwork.toml";

/// One stage of a two-step hole
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageProfile {
    pub radius: f64,
    pub depth: f64,
}

/// Named counterbore dimensions.
///
/// Element families that historically tuned their own two-step holes keep
/// their numbers here instead of in separate helpers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CounterboreProfile {
    pub first: StageProfile,
    pub second: StageProfile,
}

/// Distances at which outlines drop segments
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodConfig {
    pub mid_distance: f64,
    pub far_distance: f64,
    pub min_segments: u32,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            mid_distance: 400.0,
            far_distance: 1200.0,
            min_segments: 8,
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Result cache time-to-live in seconds
    pub cache_max_age_secs: u64,
    /// Capacity of the batching merge cache
    pub merge_cache_capacity: usize,
    /// Members per combined shape (1..=10)
    pub batch_size: usize,
    /// Decimal places kept when rounding rotations for keys
    pub rotation_precision: u32,
    /// Added to the parent thickness for auto-depth holes
    pub depth_extension: f64,
    /// Segment count for round holes when none is given
    pub default_segments: u32,
    /// Vertex weld distance used by the post-boolean cleanup
    pub weld_epsilon: f64,
    /// Builds slower than this are flagged by the profiler
    pub slow_build_ms: f64,
    /// Profiler trims once it holds more than this many records
    pub profiler_capacity: usize,
    /// Records kept after a trim
    pub profiler_retain: usize,
    pub lod: LodConfig,
    pub counterbore_profiles: BTreeMap<String, CounterboreProfile>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let mut counterbore_profiles = BTreeMap::new();
        counterbore_profiles.insert(
            "panel".to_string(),
            CounterboreProfile {
                first: StageProfile {
                    radius: 8.7,
                    depth: 0.3,
                },
                second: StageProfile {
                    radius: 6.6,
                    depth: 0.9,
                },
            },
        );
        counterbore_profiles.insert(
            "bracket".to_string(),
            CounterboreProfile {
                first: StageProfile {
                    radius: 8.5,
                    depth: 0.4,
                },
                second: StageProfile {
                    radius: 6.5,
                    depth: 0.8,
                },
            },
        );

        Self {
            cache_max_age_secs: 300,
            merge_cache_capacity: 50,
            batch_size: MAX_BATCH_SIZE,
            rotation_precision: 4,
            depth_extension: 0.1,
            default_segments: 32,
            weld_epsilon: 1e-5,
            slow_build_ms: 100.0,
            profiler_capacity: 1000,
            profiler_retain: 500,
            lod: LodConfig::default(),
            counterbore_profiles,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: PipelineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `cutwork.toml` if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(DEFAULT_CONFIG_FILE).exists() {
            Self::from_file(DEFAULT_CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `CUTWORK_*` environment variable overrides; unparsable values are ignored
    pub fn apply_env_overrides(&mut self) {
        if let Some(secs) = env_parse("CUTWORK_CACHE_MAX_AGE_SECS") {
            self.cache_max_age_secs = secs;
        }
        if let Some(capacity) = env_parse("CUTWORK_MERGE_CACHE_CAPACITY") {
            self.merge_cache_capacity = capacity;
        }
        if let Some(size) = env_parse("CUTWORK_BATCH_SIZE") {
            self.batch_size = size;
        }
        if let Some(ms) = env_parse("CUTWORK_SLOW_BUILD_MS") {
            self.slow_build_ms = ms;
        }
        if let Some(segments) = env_parse("CUTWORK_DEFAULT_SEGMENTS") {
            self.default_segments = segments;
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            bail!("batch_size must be between 1 and {}, got {}", MAX_BATCH_SIZE, self.batch_size);
        }
        if self.profiler_retain > self.profiler_capacity {
            bail!(
                "profiler_retain ({}) exceeds profiler_capacity ({})",
                self.profiler_retain,
                self.profiler_capacity
            );
        }
        if !(self.depth_extension.is_finite() && self.depth_extension >= 0.0) {
            bail!("depth_extension must be a non-negative number");
        }
        if !(self.slow_build_ms.is_finite() && self.slow_build_ms >= 0.0) {
            bail!(
                "slow_build_ms must be a non-negative number, got {}",
                self.slow_build_ms
            );
        }
        if self.lod.mid_distance > self.lod.far_distance {
            bail!("lod.mid_distance must not exceed lod.far_distance");
        }
        Ok(())
    }

    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache_max_age_secs)
    }

    /// Slow-build threshold; out-of-range values saturate instead of failing
    pub fn slow_build_threshold(&self) -> Duration {
        Duration::try_from_secs_f64(self.slow_build_ms.max(0.0) / 1000.0).unwrap_or(Duration::MAX)
    }

    pub fn counterbore_profile(&self, name: &str) -> Option<&CounterboreProfile> {
        self.counterbore_profiles.get(name)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
