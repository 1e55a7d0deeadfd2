//! Session manager backed by the shared store.

use super::{Session, SessionUpdate, TokenKind};
use crate::cache::{cache_keys, StoreClient, StoreExt};
use async_trait::async_trait;
use bazaar_core::{BazaarError, BazaarResult, SessionId, UserId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shaku::{Component, Interface};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default sliding session TTL (1 hour).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3600);

/// Default password reset token lifetime (10 minutes).
pub const DEFAULT_PASSWORD_RESET_TTL: Duration = Duration::from_secs(600);

/// Session and token operations.
///
/// An unknown or expired session id is never an error: lookups return `None`
/// and mutations return `false`. Errors mean the store could not be reached.
#[async_trait]
pub trait SessionManager: Interface + Send + Sync {
    /// Create and store a new session for a user.
    async fn create_session(&self, user_id: UserId, email: &str) -> BazaarResult<Session>;

    /// Read a session. Does not extend its lifetime.
    async fn get_session(&self, id: &SessionId) -> BazaarResult<Option<Session>>;

    /// Restart the expiry window of a live session.
    ///
    /// Returns `false` if the session does not exist.
    async fn extend_session(&self, id: &SessionId) -> BazaarResult<bool>;

    /// Merge changes into a live session, refreshing its activity and TTL.
    async fn update_session(
        &self,
        id: &SessionId,
        update: SessionUpdate,
    ) -> BazaarResult<Option<Session>>;

    /// Store one data entry on a live session.
    async fn set_session_data(&self, id: &SessionId, key: &str, value: Value) -> BazaarResult<bool>;

    /// Read one data entry from a session.
    async fn get_session_data(&self, id: &SessionId, key: &str) -> BazaarResult<Option<Value>>;

    /// Delete a session immediately. Returns `true` if it existed.
    async fn destroy_session(&self, id: &SessionId) -> BazaarResult<bool>;

    /// Store a payload under a fresh random token.
    ///
    /// `ttl` defaults to the configured lifetime for the token kind.
    async fn issue_token(
        &self,
        kind: TokenKind,
        payload: Value,
        ttl: Option<Duration>,
    ) -> BazaarResult<String>;

    /// Read a token's payload without consuming it.
    async fn peek_token(&self, kind: TokenKind, token: &str) -> BazaarResult<Option<Value>>;

    /// Read a token's payload and delete the token.
    ///
    /// Read and delete are two commands, so two concurrent consumers may both
    /// observe the payload.
    async fn consume_token(&self, kind: TokenKind, token: &str) -> BazaarResult<Option<Value>>;
}

/// Typed helpers over [`SessionManager`].
#[async_trait]
pub trait SessionManagerExt: SessionManager {
    /// Read one data entry and decode it as `T`.
    async fn get_session_data_as<T: DeserializeOwned + Send>(
        &self,
        id: &SessionId,
        key: &str,
    ) -> BazaarResult<Option<T>> {
        match self.get_session_data(id, key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Issue a password reset token carrying `payload`.
    async fn issue_password_reset<T: Serialize + Send + Sync + ?Sized>(
        &self,
        payload: &T,
    ) -> BazaarResult<String> {
        let payload = serde_json::to_value(payload)?;
        self.issue_token(TokenKind::PasswordReset, payload, None).await
    }

    /// Consume a token and decode its payload as `T`.
    async fn consume_token_as<T: DeserializeOwned + Send>(
        &self,
        kind: TokenKind,
        token: &str,
    ) -> BazaarResult<Option<T>> {
        match self.consume_token(kind, token).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }
}

impl<S: SessionManager + ?Sized> SessionManagerExt for S {}

/// Session manager storing sessions and tokens in the shared store.
#[derive(Component)]
#[shaku(interface = SessionManager)]
pub struct SessionManagerComponent {
    #[shaku(inject)]
    store: Arc<dyn StoreClient>,
    #[shaku(default = DEFAULT_SESSION_TTL)]
    session_ttl: Duration,
    #[shaku(default = DEFAULT_PASSWORD_RESET_TTL)]
    password_reset_ttl: Duration,
}

impl SessionManagerComponent {
    /// Create a session manager with the default TTLs.
    #[must_use]
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        Self::with_ttls(store, DEFAULT_SESSION_TTL, DEFAULT_PASSWORD_RESET_TTL)
    }

    /// Create a session manager with explicit TTLs.
    #[must_use]
    pub fn with_ttls(
        store: Arc<dyn StoreClient>,
        session_ttl: Duration,
        password_reset_ttl: Duration,
    ) -> Self {
        Self {
            store,
            session_ttl,
            password_reset_ttl,
        }
    }

    fn token_ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::PasswordReset => self.password_reset_ttl,
        }
    }

    async fn write(&self, session: &Session) -> BazaarResult<()> {
        self.store
            .set(&cache_keys::session(&session.id), session, self.session_ttl)
            .await
    }
}

#[async_trait]
impl SessionManager for SessionManagerComponent {
    async fn create_session(&self, user_id: UserId, email: &str) -> BazaarResult<Session> {
        let session = Session::new(user_id, email);
        self.write(&session).await?;
        info!("Created session for user {}", user_id);
        Ok(session)
    }

    async fn get_session(&self, id: &SessionId) -> BazaarResult<Option<Session>> {
        self.store.get::<Session>(&cache_keys::session(id)).await
    }

    async fn extend_session(&self, id: &SessionId) -> BazaarResult<bool> {
        let Some(mut session) = self.get_session(id).await? else {
            return Ok(false);
        };
        session.touch();
        self.write(&session).await?;
        debug!("Extended session {}", id);
        Ok(true)
    }

    async fn update_session(
        &self,
        id: &SessionId,
        update: SessionUpdate,
    ) -> BazaarResult<Option<Session>> {
        let Some(mut session) = self.get_session(id).await? else {
            return Ok(None);
        };
        update.apply_to(&mut session);
        session.touch();
        self.write(&session).await?;
        Ok(Some(session))
    }

    async fn set_session_data(&self, id: &SessionId, key: &str, value: Value) -> BazaarResult<bool> {
        let updated = self
            .update_session(id, SessionUpdate::with_data(key, value))
            .await?;
        Ok(updated.is_some())
    }

    async fn get_session_data(&self, id: &SessionId, key: &str) -> BazaarResult<Option<Value>> {
        let session = self.get_session(id).await?;
        Ok(session.and_then(|mut s| s.data.remove(key)))
    }

    async fn destroy_session(&self, id: &SessionId) -> BazaarResult<bool> {
        let existed = self.store.delete(&cache_keys::session(id)).await?;
        info!("Destroyed session {} (existed: {})", id, existed);
        Ok(existed)
    }

    async fn issue_token(
        &self,
        kind: TokenKind,
        payload: Value,
        ttl: Option<Duration>,
    ) -> BazaarResult<String> {
        let ttl = ttl.unwrap_or_else(|| self.token_ttl(kind));
        if ttl.is_zero() {
            return Err(BazaarError::Validation(
                "Token lifetime must be non-zero".to_string(),
            ));
        }

        let token = Uuid::new_v4().simple().to_string();
        self.store
            .set(&cache_keys::token(kind, &token), &payload, ttl)
            .await?;
        debug!("Issued {} token valid for {:?}", kind.prefix(), ttl);
        Ok(token)
    }

    async fn peek_token(&self, kind: TokenKind, token: &str) -> BazaarResult<Option<Value>> {
        self.store.get_value(&cache_keys::token(kind, token)).await
    }

    async fn consume_token(&self, kind: TokenKind, token: &str) -> BazaarResult<Option<Value>> {
        let key = cache_keys::token(kind, token);
        let Some(payload) = self.store.get_value(&key).await? else {
            return Ok(None);
        };

        if !self.store.delete(&key).await? {
            warn!("{} token vanished while being consumed", kind.prefix());
        }
        Ok(Some(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStoreClient;
    use serde_json::json;

    fn setup(session_ttl: Duration) -> (Arc<MemoryStoreClient>, SessionManagerComponent) {
        let store = Arc::new(MemoryStoreClient::new());
        let manager =
            SessionManagerComponent::with_ttls(store.clone(), session_ttl, Duration::from_secs(60));
        (store, manager)
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let (store, manager) = setup(DEFAULT_SESSION_TTL);
        let session = manager.create_session(UserId(7), "ada@example.com").await.unwrap();

        assert!(store.contains(&format!("session:{}", session.id)));
        let loaded = manager.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded, session);
    }

    #[tokio::test]
    async fn test_unknown_session_is_absent_not_error() {
        let (_store, manager) = setup(DEFAULT_SESSION_TTL);
        let id = SessionId::from("nope");

        assert!(manager.get_session(&id).await.unwrap().is_none());
        assert!(!manager.extend_session(&id).await.unwrap());
        assert!(manager.update_session(&id, SessionUpdate::default()).await.unwrap().is_none());
        assert!(!manager.set_session_data(&id, "k", json!(1)).await.unwrap());
        assert!(!manager.destroy_session(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_extend_slides_expiry() {
        let (_store, manager) = setup(Duration::from_millis(300));
        let session = manager.create_session(UserId(1), "a@example.com").await.unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(manager.extend_session(&session.id).await.unwrap());
        tokio::time::sleep(Duration::from_millis(200)).await;

        let live = manager.get_session(&session.id).await.unwrap().unwrap();
        assert!(live.last_activity > session.last_activity);
        assert_eq!(live.created_at, session.created_at);
    }

    #[tokio::test]
    async fn test_session_expires_without_activity() {
        let (_store, manager) = setup(Duration::from_millis(50));
        let session = manager.create_session(UserId(1), "a@example.com").await.unwrap();

        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(manager.get_session(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_data_round_trip() {
        let (_store, manager) = setup(DEFAULT_SESSION_TTL);
        let session = manager.create_session(UserId(3), "c@example.com").await.unwrap();

        assert!(manager
            .set_session_data(&session.id, "cart", json!([1, 2, 3]))
            .await
            .unwrap());

        let cart: Option<Vec<i64>> = manager.get_session_data_as(&session.id, "cart").await.unwrap();
        assert_eq!(cart, Some(vec![1, 2, 3]));
        assert!(manager
            .get_session_data(&session.id, "missing")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_session_fields() {
        let (_store, manager) = setup(DEFAULT_SESSION_TTL);
        let session = manager.create_session(UserId(3), "old@example.com").await.unwrap();

        let update = SessionUpdate {
            email: Some("new@example.com".to_string()),
            ..Default::default()
        };
        let updated = manager.update_session(&session.id, update).await.unwrap().unwrap();

        assert_eq!(updated.email, "new@example.com");
        assert_eq!(updated.user_id, UserId(3));
    }

    #[tokio::test]
    async fn test_destroy_session() {
        let (_store, manager) = setup(DEFAULT_SESSION_TTL);
        let session = manager.create_session(UserId(1), "a@example.com").await.unwrap();

        assert!(manager.destroy_session(&session.id).await.unwrap());
        assert!(manager.get_session(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_token_is_single_use() {
        let (store, manager) = setup(DEFAULT_SESSION_TTL);
        let token = manager
            .issue_password_reset(&json!({"email": "ada@example.com"}))
            .await
            .unwrap();

        assert!(store.contains(&format!("password_reset:{}", token)));
        let peeked = manager.peek_token(TokenKind::PasswordReset, &token).await.unwrap();
        assert_eq!(peeked, Some(json!({"email": "ada@example.com"})));

        let first = manager.consume_token(TokenKind::PasswordReset, &token).await.unwrap();
        let second = manager.consume_token(TokenKind::PasswordReset, &token).await.unwrap();
        assert_eq!(first, Some(json!({"email": "ada@example.com"})));
        assert_eq!(second, None);
    }

    #[tokio::test]
    async fn test_token_expires() {
        let (_store, manager) = setup(DEFAULT_SESSION_TTL);
        let token = manager
            .issue_token(
                TokenKind::PasswordReset,
                json!("ada@example.com"),
                Some(Duration::from_millis(20)),
            )
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(40)).await;

        let consumed: Option<String> = manager
            .consume_token_as(TokenKind::PasswordReset, &token)
            .await
            .unwrap();
        assert!(consumed.is_none());
    }

    #[tokio::test]
    async fn test_zero_token_lifetime_rejected() {
        let (_store, manager) = setup(DEFAULT_SESSION_TTL);
        let result = manager
            .issue_token(TokenKind::PasswordReset, json!(1), Some(Duration::ZERO))
            .await;
        assert!(matches!(result, Err(BazaarError::Validation(_))));
    }

    #[tokio::test]
    async fn test_store_outage_is_an_error() {
        let (store, manager) = setup(DEFAULT_SESSION_TTL);
        store.set_online(false);

        let err = manager.get_session(&SessionId::from("abc")).await.unwrap_err();
        assert!(err.is_store_failure());
    }
}
