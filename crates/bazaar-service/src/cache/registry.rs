//! Registry of cache keys the application believes are live.
//!
//! The store cannot enumerate its own keys, so every cache write through the
//! coordinator records its key here and every invalidation removes it. The set
//! is mirrored into the store under [`REGISTRY_KEY`] so it survives restarts.
//!
//! The persisted copy is a plain snapshot: concurrent processes overwrite each
//! other and the last writer wins. [`KeyRegistry::list_live`] repairs entries
//! whose keys expired or were removed behind the registry's back.

use super::cache_keys::REGISTRY_KEY;
use super::{StoreClient, NO_EXPIRY};
use async_trait::async_trait;
use bazaar_core::BazaarResult;
use futures::future::join_all;
use parking_lot::RwLock;
use shaku::{Component, Interface};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Tracks cache keys written by this process.
///
/// Bookkeeping failures are never surfaced: a registry that fails to persist
/// only loses visibility, never correctness of the data path.
#[async_trait]
pub trait KeyRegistry: Interface + Send + Sync {
    /// Replace the in-memory set with the persisted one.
    ///
    /// Best effort: an absent, corrupt or unreachable snapshot starts an empty
    /// set. Returns the number of keys loaded.
    async fn load(&self) -> usize;

    /// Record a key. Idempotent.
    async fn track(&self, key: &str);

    /// Forget a key. Idempotent.
    async fn untrack(&self, key: &str);

    /// Forget every key.
    async fn clear(&self);

    /// Snapshot of the tracked keys, without consulting the store.
    fn tracked(&self) -> Vec<String>;

    /// Tracked keys that still hold a value.
    ///
    /// Keys whose values are gone are dropped from the registry as a side
    /// effect. Store transport failures are returned, not swallowed.
    async fn list_live(&self) -> BazaarResult<Vec<String>>;
}

/// Key registry mirrored into the shared store.
#[derive(Component)]
#[shaku(interface = KeyRegistry)]
pub struct TrackedKeyRegistry {
    #[shaku(inject)]
    store: Arc<dyn StoreClient>,
    #[shaku(default)]
    keys: RwLock<BTreeSet<String>>,
}

impl TrackedKeyRegistry {
    /// Create an empty registry over a store.
    #[must_use]
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        Self {
            store,
            keys: RwLock::new(BTreeSet::new()),
        }
    }

    async fn persist(&self) {
        let snapshot: Vec<String> = self.keys.read().iter().cloned().collect();

        let payload = match serde_json::to_string(&snapshot) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to encode key registry: {}", e);
                return;
            }
        };

        if let Err(e) = self.store.set_raw(REGISTRY_KEY, &payload, NO_EXPIRY).await {
            warn!("Failed to persist key registry ({} keys): {}", snapshot.len(), e);
        }
    }
}

#[async_trait]
impl KeyRegistry for TrackedKeyRegistry {
    async fn load(&self) -> usize {
        let mut corrupt = false;
        let loaded = match self.store.get_raw(REGISTRY_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(keys) => Some(keys),
                Err(e) => {
                    warn!("Persisted key registry is corrupt, starting empty: {}", e);
                    corrupt = true;
                    None
                }
            },
            Ok(None) => {
                debug!("No persisted key registry found");
                None
            }
            Err(e) => {
                warn!("Could not load key registry, starting empty: {}", e);
                None
            }
        };

        let count = {
            let mut keys = self.keys.write();
            keys.clear();
            if let Some(loaded) = loaded {
                keys.extend(loaded.into_iter().filter(|k| k != REGISTRY_KEY));
            }
            keys.len()
        };

        // Overwrite the unreadable snapshot so the next start finds a valid one.
        if corrupt {
            self.persist().await;
        }

        info!("Key registry loaded with {} keys", count);
        count
    }

    async fn track(&self, key: &str) {
        if key == REGISTRY_KEY {
            return;
        }
        let inserted = self.keys.write().insert(key.to_string());
        if inserted {
            self.persist().await;
        }
    }

    async fn untrack(&self, key: &str) {
        let removed = self.keys.write().remove(key);
        if removed {
            self.persist().await;
        }
    }

    async fn clear(&self) {
        self.keys.write().clear();
        self.persist().await;
    }

    fn tracked(&self) -> Vec<String> {
        self.keys.read().iter().cloned().collect()
    }

    async fn list_live(&self) -> BazaarResult<Vec<String>> {
        let candidates = self.tracked();
        let lookups = join_all(candidates.iter().map(|key| self.store.get_raw(key))).await;

        let mut live = Vec::with_capacity(candidates.len());
        let mut stale = Vec::new();
        for (key, lookup) in candidates.into_iter().zip(lookups) {
            match lookup? {
                Some(_) => live.push(key),
                None => stale.push(key),
            }
        }

        if !stale.is_empty() {
            {
                let mut keys = self.keys.write();
                for key in &stale {
                    keys.remove(key);
                }
            }
            debug!("Dropped {} stale keys from registry", stale.len());
            self.persist().await;
        }

        Ok(live)
    }
}

/// Registry that remembers nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopKeyRegistry;

#[async_trait]
impl KeyRegistry for NoopKeyRegistry {
    async fn load(&self) -> usize {
        0
    }

    async fn track(&self, _key: &str) {}

    async fn untrack(&self, _key: &str) {}

    async fn clear(&self) {}

    fn tracked(&self) -> Vec<String> {
        Vec::new()
    }

    async fn list_live(&self) -> BazaarResult<Vec<String>> {
        Ok(Vec::new())
    }
}
