//! Surrogate-key allocation.
//!
//! The storage engine provides no auto-increment, so the process
//! generates its own dimension ids: a per-table monotonic counter
//! seeded from `MAX(<key>)` at startup, plus a short-lived content
//! cache that lets concurrent runs with identical dimension content
//! share one id instead of inserting duplicate rows.
//!
//! The cache is an optimisation for burst traffic, not a correctness
//! guarantee: after an entry expires the same content allocates a new
//! id and a duplicate dimension row may result.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::schema::Table;

/// How long a content key stays mapped to its id.
pub const CACHE_TTL: Duration = Duration::from_secs(100);

/// Per-table id generator with a TTL'd content cache.
///
/// All state sits behind one mutex; the increment, the cache store
/// and the expiry sweep form a single critical section.
#[derive(Debug)]
pub struct KeyBank {
    ttl: Duration,
    inner: Mutex<Bank>,
}

#[derive(Debug, Default)]
struct Bank {
    next_id: HashMap<Table, u64>,
    cache: HashMap<(Table, String), Entry>,
}

#[derive(Debug)]
struct Entry {
    id: u64,
    inserted_at: Instant,
}

impl KeyBank {
    /// A bank with the default 100 s cache TTL.
    pub fn new() -> Self {
        Self::with_ttl(CACHE_TTL)
    }

    /// A bank with a custom cache TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(Bank::default()),
        }
    }

    /// Seed a table's counter. Called once per dimension at startup
    /// with the `MAX(<key>)` read from the database; the next
    /// allocation returns `value + 1`.
    pub fn set(&self, table: Table, value: u64) {
        let mut bank = self.inner.lock().expect("key bank lock poisoned");
        bank.next_id.insert(table, value);
    }

    /// Resolve an id for a dimension's content.
    ///
    /// Returns `(id, true)` when the content was allocated within the
    /// TTL window, reusing the id without advancing the counter.
    /// Otherwise advances the counter, caches the mapping and returns
    /// `(id, false)`.
    pub fn request_key(&self, table: Table, content_key: &str) -> (u64, bool) {
        let mut bank = self.inner.lock().expect("key bank lock poisoned");
        let now = Instant::now();
        let ttl = self.ttl;
        bank.cache
            .retain(|_, entry| now.duration_since(entry.inserted_at) < ttl);

        let cache_key = (table, content_key.to_string());
        if let Some(entry) = bank.cache.get(&cache_key) {
            return (entry.id, true);
        }

        let next = bank.next_id.entry(table).or_insert(0);
        *next += 1;
        let id = *next;
        bank.cache.insert(cache_key, Entry { id, inserted_at: now });
        (id, false)
    }

    /// The current counter value for a table (the last allocated id).
    pub fn current(&self, table: Table) -> u64 {
        let bank = self.inner.lock().expect("key bank lock poisoned");
        bank.next_id.get(&table).copied().unwrap_or(0)
    }
}

impl Default for KeyBank {
    fn default() -> Self {
        Self::new()
    }
}
