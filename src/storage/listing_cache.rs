// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LRU cache for mirror-store listings.
//!
//! Listing reads (active tokens, a recipient's aid, a user's distributions)
//! are served from here until a write invalidates them or the TTL passes.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

/// Cached listing + insertion timestamp.
struct CacheEntry<V> {
    rows: Vec<V>,
    inserted_at: Instant,
}

/// In-process LRU cache keyed by listing scope (e.g. a user id).
pub struct ListingCache<V> {
    cache: Mutex<LruCache<String, CacheEntry<V>>>,
    ttl: Duration,
}

impl<V: Clone> ListingCache<V> {
    /// Create a new cache with the given capacity and TTL.
    ///
    /// - `capacity`: Max number of listing scopes to cache.
    /// - `ttl`: Time-to-live for each cache entry.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            ttl,
        }
    }

    /// Cached rows for `scope`. `None` if not cached or expired.
    pub fn get(&self, scope: &str) -> Option<Vec<V>> {
        let mut cache = self.cache.lock().ok()?;
        if let Some(entry) = cache.get(scope) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.rows.clone());
            }
            cache.pop(scope);
        }
        None
    }

    pub fn put(&self, scope: &str, rows: Vec<V>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                scope.to_string(),
                CacheEntry {
                    rows,
                    inserted_at: Instant::now(),
                },
            );
        }
    }

    /// Drop one scope.
    pub fn invalidate(&self, scope: &str) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.pop(scope);
        }
    }

    /// Drop every scope.
    pub fn invalidate_all(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }
}
