//! Store client trait for the shared key-value store.

use bazaar_core::BazaarResult;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shaku::Interface;
use std::time::Duration;
use tracing::warn;

/// TTL meaning "never expires".
pub const NO_EXPIRY: Duration = Duration::ZERO;

/// Thin client over the shared key-value store.
///
/// Payloads are strings. A missing or expired key is `Ok(None)`; a transport
/// failure is always `Err(BazaarError::StoreUnavailable)` so callers can tell
/// the two apart.
#[async_trait]
pub trait StoreClient: Interface + Send + Sync {
    /// Get the stored payload for a key.
    async fn get_raw(&self, key: &str) -> BazaarResult<Option<String>>;

    /// Store a payload. A zero `ttl` means the entry never expires.
    async fn set_raw(&self, key: &str, payload: &str, ttl: Duration) -> BazaarResult<()>;

    /// Delete a key.
    ///
    /// Returns `true` if the key existed. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> BazaarResult<bool>;

    /// Remove every entry in the store, including entries written by other processes.
    async fn flush(&self) -> BazaarResult<()>;

    /// Round-trip to the store to check it is reachable.
    async fn ping(&self) -> BazaarResult<()>;

    /// Check if the store is enabled.
    fn is_enabled(&self) -> bool;
}

/// Encode a value the way the store expects it.
///
/// Strings are stored verbatim, everything else as JSON text.
pub fn encode_payload<T: Serialize + ?Sized>(value: &T) -> BazaarResult<String> {
    Ok(match serde_json::to_value(value)? {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Decode a stored payload, falling back to the raw text when it is not JSON.
#[must_use]
pub fn decode_payload(raw: String) -> Value {
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(_) => Value::String(raw),
    }
}

/// Extension trait with typed methods for convenience.
#[async_trait]
pub trait StoreExt: StoreClient {
    /// Get a value as loosely-typed JSON.
    ///
    /// Strings are stored without quotes, so a string that is itself valid
    /// JSON (`"42"`, `"true"`, `"[1]"`) comes back as the parsed value. Use
    /// [`StoreExt::get`] with `String` to read such values back unchanged.
    async fn get_value(&self, key: &str) -> BazaarResult<Option<Value>> {
        Ok(self.get_raw(key).await?.map(decode_payload))
    }

    /// Get a typed value.
    ///
    /// A payload that does not decode as `T` is logged and reported as a miss,
    /// so the caller reloads from the authoritative source and overwrites it.
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> BazaarResult<Option<T>> {
        let Some(raw) = self.get_raw(key).await? else {
            return Ok(None);
        };

        if let Ok(value) = serde_json::from_str::<T>(&raw) {
            return Ok(Some(value));
        }

        match serde_json::from_value::<T>(Value::String(raw)) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Undecodable payload under key '{}', treating as miss: {}", key, e);
                Ok(None)
            }
        }
    }

    /// Set a typed value.
    ///
    /// Strings are written verbatim and everything else as JSON, see
    /// [`encode_payload`].
    async fn set<T: Serialize + Send + Sync + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> BazaarResult<()> {
        let payload = encode_payload(value)?;
        self.set_raw(key, &payload, ttl).await
    }
}

impl<S: StoreClient + ?Sized> StoreExt for S {}
