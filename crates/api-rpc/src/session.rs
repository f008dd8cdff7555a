//! Session Registry
//!
//! Opaque bearer tokens issued at login, resolved to a `Session` on every
//! call. In-memory: a daemon restart logs everybody out.

use queuedesk_core::domain::{Session, StaffId};
use queuedesk_core::error::{AppError, Result};
use queuedesk_core::port::{IdProvider, TimeProvider};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
struct SessionRecord {
    session: Session,
    expires_at: i64,
}

/// A freshly issued token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionRecord>>,
    ttl_ms: i64,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl SessionRegistry {
    pub fn new(
        ttl_ms: i64,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl_ms,
            id_provider,
            time_provider,
        }
    }

    /// Issue a token for an authenticated session
    pub async fn issue(&self, session: Session) -> IssuedToken {
        let now = self.time_provider.now_millis();
        let token = self.id_provider.generate_id();
        let expires_at = now + self.ttl_ms;

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, record| record.expires_at > now);
        sessions.insert(
            token.clone(),
            SessionRecord {
                session,
                expires_at,
            },
        );

        IssuedToken { token, expires_at }
    }

    /// No token: anonymous. Unknown or expired token: Unauthorized.
    pub async fn resolve(&self, token: Option<&str>) -> Result<Session> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Ok(Session::Anonymous);
        };

        let now = self.time_provider.now_millis();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                Some(record) if record.expires_at > now => return Ok(record.session.clone()),
                Some(_) => {}
                None => return Err(AppError::Unauthorized("unknown session token".to_string())),
            }
        }

        self.sessions.write().await.remove(token);
        debug!("Expired session token removed");
        Err(AppError::Unauthorized("session expired".to_string()))
    }

    /// Revoke one token. Returns false if it was not active.
    pub async fn revoke(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Drop every session of a staff member (deleted, or code rotated)
    pub async fn revoke_staff(&self, staff_id: &StaffId) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| {
            record
                .session
                .staff()
                .map_or(true, |identity| &identity.staff_id != staff_id)
        });
        before - sessions.len()
    }
}
