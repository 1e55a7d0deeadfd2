//! In-process store client.
//!
//! Keeps entries in a map guarded by a mutex and expires them lazily on read.
//! Used for local development without a store server and as the test double
//! behind every service in this crate.

use super::StoreClient;
use async_trait::async_trait;
use bazaar_core::{BazaarError, BazaarResult};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    payload: String,
    /// None = no expiration
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(payload: String, ttl: Duration) -> Self {
        let expires_at = (!ttl.is_zero()).then(|| Instant::now() + ttl);
        Self { payload, expires_at }
    }

    /// An entry is expired once its deadline has been reached.
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Command counters for the in-process store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStoreStats {
    /// Reads that found a live entry
    pub hits: u64,
    /// Reads that found nothing or an expired entry
    pub misses: u64,
    /// Successful `set_raw` calls
    pub writes: u64,
    /// Successful `delete` calls
    pub deletes: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    stats: MemoryStoreStats,
}

/// Store client backed by process memory.
#[derive(Debug)]
pub struct MemoryStoreClient {
    inner: Mutex<Inner>,
    online: AtomicBool,
    failures_pending: AtomicU32,
}

impl Default for MemoryStoreClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStoreClient {
    /// Create an empty, reachable store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            online: AtomicBool::new(true),
            failures_pending: AtomicU32::new(0),
        }
    }

    /// Simulate the store going away (`false`) or coming back (`true`).
    ///
    /// While offline every command fails with `StoreUnavailable`; entries are kept.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Make the next `count` commands fail with `StoreUnavailable`.
    pub fn fail_next(&self, count: u32) {
        self.failures_pending.store(count, Ordering::SeqCst);
    }

    /// Returns the command counters.
    #[must_use]
    pub fn stats(&self) -> MemoryStoreStats {
        self.inner.lock().stats
    }

    /// Number of live (unexpired) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .entries
            .values()
            .filter(|entry| !entry.is_expired())
            .count()
    }

    /// Returns `true` if no live entries remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if a live entry exists under `key`. Does not touch the counters.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    fn check_reachable(&self, command: &str) -> BazaarResult<()> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(BazaarError::store(format!("{} failed: store offline", command)));
        }

        let injected = self
            .failures_pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(BazaarError::store(format!("{} failed: connection reset", command)));
        }

        Ok(())
    }
}

#[async_trait]
impl StoreClient for MemoryStoreClient {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn get_raw(&self, key: &str) -> BazaarResult<Option<String>> {
        self.check_reachable("GET")?;

        let mut inner = self.inner.lock();
        let live = match inner.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                inner.entries.remove(key);
                None
            }
            Some(entry) => Some(entry.payload.clone()),
            None => None,
        };

        if live.is_some() {
            inner.stats.hits += 1;
        } else {
            inner.stats.misses += 1;
        }
        Ok(live)
    }

    async fn set_raw(&self, key: &str, payload: &str, ttl: Duration) -> BazaarResult<()> {
        self.check_reachable("SET")?;

        let mut inner = self.inner.lock();
        inner
            .entries
            .insert(key.to_string(), Entry::new(payload.to_string(), ttl));
        inner.stats.writes += 1;
        debug!("Stored key '{}' in memory (ttl {:?})", key, ttl);
        Ok(())
    }

    async fn delete(&self, key: &str) -> BazaarResult<bool> {
        self.check_reachable("DEL")?;

        let mut inner = self.inner.lock();
        let existed = inner
            .entries
            .remove(key)
            .is_some_and(|entry| !entry.is_expired());
        inner.stats.deletes += 1;
        Ok(existed)
    }

    async fn flush(&self) -> BazaarResult<()> {
        self.check_reachable("FLUSH")?;
        self.inner.lock().entries.clear();
        Ok(())
    }

    async fn ping(&self) -> BazaarResult<()> {
        self.check_reachable("PING")
    }
}
