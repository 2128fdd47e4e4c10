// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Finished-geometry cache with lazy TTL eviction

use crate::geometry::Mesh;
use crate::ops::CacheKey;
use ahash::AHashMap;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry {
    mesh: Mesh,
    stored_at: Instant,
    build_time: Duration,
}

/// Memoizes built meshes by canonical key.
///
/// Entries are checked against `max_age` only when read.
#[derive(Debug, Clone)]
pub struct ResultCache {
    entries: AHashMap<CacheKey, CacheEntry>,
    max_age: Duration,
}

impl ResultCache {
    pub fn new(max_age: Duration) -> Self {
        Self {
            entries: AHashMap::new(),
            max_age,
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn get(&mut self, key: &CacheKey) -> Option<Mesh> {
        self.get_at(key, Instant::now())
    }

    /// Lookup as of `now`; an expired entry is removed and reported as a miss
    pub fn get_at(&mut self, key: &CacheKey, now: Instant) -> Option<Mesh> {
        let entry = self.entries.get(key)?;
        if now.saturating_duration_since(entry.stored_at) < self.max_age {
            return Some(entry.mesh.clone());
        }

        debug!("Cache entry {} expired", key.fingerprint());
        self.entries.remove(key);
        None
    }

    pub fn set(&mut self, key: CacheKey, mesh: &Mesh, build_time: Duration) {
        self.set_at(key, mesh, build_time, Instant::now());
    }

    pub fn set_at(&mut self, key: CacheKey, mesh: &Mesh, build_time: Duration, now: Instant) {
        self.entries.insert(
            key,
            CacheEntry {
                mesh: mesh.clone(),
                stored_at: now,
                build_time,
            },
        );
    }

    /// Build time recorded with a live entry
    pub fn build_time(&self, key: &CacheKey) -> Option<Duration> {
        self.entries.get(key).map(|entry| entry.build_time)
    }

    /// Drop every entry older than `max_age`; returns how many were removed
    pub fn purge_expired(&mut self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let max_age = self.max_age;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.stored_at) < max_age);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}
