//! Session gate for request guards.

use super::{Session, SessionManager};
use bazaar_core::{BazaarError, BazaarResult, SessionId};
use std::sync::Arc;
use tracing::debug;

/// Request header carrying the session id.
pub const SESSION_HEADER: &str = "session-id";

/// Resolves the session id presented by a request into a live session.
///
/// A successful check extends the session, so active users never time out.
#[derive(Clone)]
pub struct SessionGate {
    sessions: Arc<dyn SessionManager>,
}

impl SessionGate {
    /// Create a gate over a session manager.
    #[must_use]
    pub fn new(sessions: Arc<dyn SessionManager>) -> Self {
        Self { sessions }
    }

    /// Authenticate a request by its session id.
    ///
    /// Returns the session as it was before the extension. Fails with
    /// `Unauthorized` when no id is presented and `InvalidSession` when the id
    /// names no live session. Store outages propagate as `StoreUnavailable`.
    pub async fn authenticate(&self, session_id: Option<&str>) -> BazaarResult<Session> {
        let id = session_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(SessionId::from)
            .ok_or_else(|| BazaarError::unauthorized("No session ID provided"))?;

        let session = self
            .sessions
            .get_session(&id)
            .await?
            .ok_or_else(|| BazaarError::invalid_session("Invalid or expired session"))?;

        if !self.sessions.extend_session(&id).await? {
            // Expired between the read and the extension.
            return Err(BazaarError::invalid_session("Invalid or expired session"));
        }

        debug!("Authenticated session {} for user {}", id, session.user_id);
        Ok(session)
    }
}
