//! In-memory current-conditions cache keyed by exact coordinate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::types::{Coordinate, WeatherSnapshot};

/// Source of "now" in epoch milliseconds
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to. Used for TTL tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Storage for current-conditions snapshots
pub trait SnapshotCache: Send + Sync {
    /// Fresh snapshot for the coordinate, if any
    fn get(&self, coord: &Coordinate) -> Option<Arc<WeatherSnapshot>>;

    /// Store a snapshot, replacing whatever was there
    fn put(&self, coord: &Coordinate, snapshot: Arc<WeatherSnapshot>);
}

/// Exact-value key for a coordinate pair. Negative zero folds into zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CoordKey(u64, u64);

impl From<&Coordinate> for CoordKey {
    fn from(coord: &Coordinate) -> Self {
        Self(float_bits(coord.latitude), float_bits(coord.longitude))
    }
}

fn float_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: Arc<WeatherSnapshot>,
    inserted_at_millis: i64,
}

/// TTL cache living in process memory.
///
/// Expiry is checked lazily on `get`; a stale entry is removed and reported
/// as a miss. There is no background sweep.
pub struct MemoryCache {
    entries: RwLock<HashMap<CoordKey, CacheEntry>>,
    ttl_millis: i64,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    pub fn new(ttl_millis: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl_millis,
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    fn is_expired(&self, entry: &CacheEntry, now: i64) -> bool {
        now.saturating_sub(entry.inserted_at_millis) >= self.ttl_millis
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.len())
            .field("ttl_millis", &self.ttl_millis)
            .finish()
    }
}

impl SnapshotCache for MemoryCache {
    fn get(&self, coord: &Coordinate) -> Option<Arc<WeatherSnapshot>> {
        let key = CoordKey::from(coord);
        let now = self.clock.now_millis();

        let stale_at = {
            let entries = self.entries.read();
            let entry = entries.get(&key)?;
            if !self.is_expired(entry, now) {
                return Some(Arc::clone(&entry.snapshot));
            }
            entry.inserted_at_millis
        };

        // Only evict the entry we saw; a concurrent put may have replaced it.
        let mut entries = self.entries.write();
        if entries
            .get(&key)
            .is_some_and(|entry| entry.inserted_at_millis == stale_at)
        {
            entries.remove(&key);
            tracing::debug!("Evicted stale weather for {}", coord);
        }
        None
    }

    fn put(&self, coord: &Coordinate, snapshot: Arc<WeatherSnapshot>) {
        let entry = CacheEntry {
            snapshot,
            inserted_at_millis: self.clock.now_millis(),
        };
        self.entries.write().insert(CoordKey::from(coord), entry);
    }
}
