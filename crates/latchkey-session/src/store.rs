//! The storage contract for sessions, and an in-memory reference store.
//!
//! Latchkey doesn't implement persistence — that's the host application's
//! job (Postgres, SQLite, Redis, whatever already backs the rest of the
//! system). Instead it defines the [`SessionStore`] trait: five operations
//! keyed by session identifier and user identifier. Implement it over your
//! store and the lifecycle layer does the rest.
//!
//! [`MemoryStore`] is the reference implementation: correct, concurrent,
//! and fine for tests or single-process deployments, but it forgets
//! everything on restart.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{Session, SessionId, StoreError, UserId};

/// The five operations a session backend must provide.
///
/// # Contract
///
/// - `get` returns `Ok(None)` for an absent identifier — absence is not
///   an error. `Err` is reserved for "the store couldn't answer".
/// - `update_expiry` and `delete` on an absent identifier are no-ops, not
///   errors (the lifecycle layer relies on delete being idempotent).
/// - `delete_all` removes every session owned by the user.
///
/// # Trait bounds
///
/// - `Send + Sync` → the store is shared across request tasks.
/// - `'static` → it doesn't borrow temporary data; it lives as long as
///   the component that owns it.
pub trait SessionStore: Send + Sync + 'static {
    /// Persists a new session record keyed by its identifier.
    fn put(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Looks up a session by identifier.
    fn get(
        &self,
        id: &SessionId,
    ) -> impl Future<Output = Result<Option<Session>, StoreError>> + Send;

    /// Overwrites the expiry of an existing session.
    fn update_expiry(
        &self,
        id: &SessionId,
        expires_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Deletes one session. Deleting an absent session is not an error.
    fn delete(
        &self,
        id: &SessionId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Deletes every session owned by `user`.
    fn delete_all(
        &self,
        user: &UserId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// A store behind an `Arc` is still a store.
///
/// Lets callers share one backend between the lifecycle layer and other
/// parts of the application without wrapper types.
impl<S: SessionStore> SessionStore for Arc<S> {
    fn put(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        S::put(self, session)
    }

    fn get(
        &self,
        id: &SessionId,
    ) -> impl Future<Output = Result<Option<Session>, StoreError>> + Send {
        S::get(self, id)
    }

    fn update_expiry(
        &self,
        id: &SessionId,
        expires_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        S::update_expiry(self, id, expires_at)
    }

    fn delete(
        &self,
        id: &SessionId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        S::delete(self, id)
    }

    fn delete_all(
        &self,
        user: &UserId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        S::delete_all(self, user)
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory session store: a reader/writer-locked map.
///
/// Reads (the hot path — every authenticated request validates a session)
/// proceed concurrently; mutations take the exclusive lock. Never fails,
/// which also makes it the baseline test double.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions (any owner, including expired ones the
    /// lifecycle layer hasn't touched yet).
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if no sessions are stored.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl SessionStore for MemoryStore {
    async fn put(&self, session: &Session) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn get(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn update_expiry(
        &self,
        id: &SessionId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if let Some(session) = self.sessions.write().await.get_mut(id) {
            session.expires_at = expires_at;
        }
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), StoreError> {
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn delete_all(&self, user: &UserId) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .retain(|_, session| session.user_id != *user);
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================
