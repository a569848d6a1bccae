use std::{
    num::NonZeroUsize,
    sync::Mutex,
    time::{Duration, Instant},
};

use lru::LruCache;

use crate::models::{CandidateRoute, Coordinate};

pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_CAPACITY: usize = 256;

/// Rounds to 4 decimals, about 11 m of latitude.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([i64; 4]);

impl CacheKey {
    pub fn new(from: Coordinate, to: Coordinate) -> Self {
        let scaled = |v: f64| (round4(v) * 10_000.0).round() as i64;
        Self([
            scaled(from.lat),
            scaled(from.lng),
            scaled(to.lat),
            scaled(to.lng),
        ])
    }
}

struct CacheEntry {
    routes: Vec<CandidateRoute>,
    expires_at: Instant,
}

/// Provider answers keyed by rounded endpoints, kept for a fixed TTL.
pub struct RouteCache {
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl Default for RouteCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}

impl RouteCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn get(&self, from: Coordinate, to: Coordinate) -> Option<Vec<CandidateRoute>> {
        let key = CacheKey::new(from, to);
        let mut entries = self.entries.lock().ok()?;
        let expired = entries.get(&key)?.expires_at <= Instant::now();
        if expired {
            entries.pop(&key);
            return None;
        }
        entries.get(&key).map(|entry| entry.routes.clone())
    }

    pub fn set(&self, from: Coordinate, to: Coordinate, routes: Vec<CandidateRoute>) {
        let Ok(mut entries) = self.entries.lock() else {
            tracing::warn!("route cache lock poisoned, skipping insert");
            return;
        };
        entries.put(
            CacheKey::new(from, to),
            CacheEntry {
                routes,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
