//! The session lifecycle: creation, validation with sliding renewal,
//! and invalidation.
//!
//! This is the central piece of the session layer. It's responsible for:
//! - Creating a session record when a user logs in
//! - Validating bearer tokens on every authenticated request
//! - Sliding the expiry forward for active users
//! - Deleting sessions on logout, bulk invalidation, or expiry detection
//!
//! ```text
//! create_session() ──→ [Active] ──(validate near expiry)──→ [Renewed]
//!                          │                                    │
//!                          │  (now ≥ expires_at, lazily         │
//!                          │   detected by validate)            │
//!                          ▼                                    │
//!                      [Expired] ──→ deleted ←── invalidate() ──┘
//! ```
//!
//! # Concurrency note
//!
//! `SessionLifecycle` holds no locks of its own — consistency comes from
//! the backing store's per-key guarantees. Two concurrent validations of
//! the same session may both decide to renew; that race is benign, because
//! both write the same logical outcome (now + lifetime) and last-write-wins
//! produces a correct expiry, not a corrupted one.

use chrono::Utc;

use crate::{Session, SessionConfig, SessionId, SessionStore, StoreError, UserId};

/// The result of a successful validation: the (possibly renewed) session
/// and the user it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    /// The session record, with any renewal already applied.
    pub session: Session,

    /// The owning user, for the caller to resolve against its own user
    /// storage. Always equal to `session.user_id`.
    pub user: UserId,
}

/// Orchestrates session creation, validation, and invalidation over a
/// [`SessionStore`].
pub struct SessionLifecycle<S> {
    store: S,
    config: SessionConfig,
}

impl<S: SessionStore> SessionLifecycle<S> {
    /// Creates a lifecycle manager with the default config (30-day
    /// lifetime, 15-day renewal window).
    pub fn new(store: S) -> Self {
        Self::with_config(store, SessionConfig::default())
    }

    /// Creates a lifecycle manager with an explicit config.
    pub fn with_config(store: S, config: SessionConfig) -> Self {
        Self {
            store,
            config: config.validated(),
        }
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a session for `user` from a freshly minted bearer token.
    ///
    /// The session is keyed by the token's digest; the token itself is
    /// not retained anywhere — the caller hands it to the client and
    /// forgets it.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the record can't be persisted. No
    /// session exists in that case.
    pub async fn create_session(
        &self,
        raw_token: &str,
        user: UserId,
    ) -> Result<Session, StoreError> {
        let now = Utc::now();
        let session = Session {
            id: SessionId::from_token(raw_token),
            user_id: user,
            created_at: now,
            expires_at: now + self.config.lifetime,
        };

        self.store.put(&session).await?;

        tracing::info!(
            session = %session.id,
            user = %session.user_id,
            expires_at = %session.expires_at,
            "session created"
        );
        Ok(session)
    }

    /// Validates a bearer token, sliding the expiry forward if it is
    /// close to running out.
    ///
    /// Fails closed: an unknown token, an expired session, and a store
    /// that can't be read all return `None`. No error escapes — a caller
    /// can't tell (and must not be able to tell) an absent session from
    /// an expired one.
    ///
    /// Two write paths inside are best-effort:
    /// - deleting a just-detected expired session — if the delete fails
    ///   it is logged and the session is still reported absent (returning
    ///   a stale session would be the worse failure);
    /// - the renewal write-back — if it fails, the still-valid session is
    ///   returned with its old expiry, which remains correct until it
    ///   naturally passes.
    pub async fn validate(&self, raw_token: &str) -> Option<Validation> {
        let id = SessionId::from_token(raw_token);

        let mut session = match self.store.get(&id).await {
            Ok(Some(session)) => session,
            Ok(None) => return None,
            Err(error) => {
                tracing::warn!(
                    session = %id,
                    error = %error,
                    "session lookup failed — denying access"
                );
                return None;
            }
        };

        // A record without an owner can't be resolved to a user; treat it
        // as a miss.
        if session.user_id.as_str().is_empty() {
            tracing::warn!(session = %id, "session record has no owner — denying access");
            return None;
        }

        let now = Utc::now();

        if session.is_expired_at(now) {
            if let Err(error) = self.store.delete(&id).await {
                tracing::warn!(
                    session = %id,
                    error = %error,
                    "failed to delete expired session"
                );
            } else {
                tracing::info!(session = %id, "session expired");
            }
            return None;
        }

        if session.expires_at < now + self.config.renewal_window {
            let renewed = now + self.config.lifetime;
            match self.store.update_expiry(&id, renewed).await {
                Ok(()) => {
                    session.expires_at = renewed;
                    tracing::debug!(
                        session = %id,
                        expires_at = %renewed,
                        "session renewed"
                    );
                }
                Err(error) => {
                    // Keep serving the session on its old expiry.
                    tracing::warn!(
                        session = %id,
                        error = %error,
                        "session renewal write failed — keeping current expiry"
                    );
                }
            }
        }

        let user = session.user_id.clone();
        Some(Validation { session, user })
    }

    /// Invalidates one session (logout).
    ///
    /// Idempotent: invalidating a session that doesn't exist succeeds.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the store can't perform the delete.
    pub async fn invalidate(&self, id: &SessionId) -> Result<(), StoreError> {
        self.store.delete(id).await?;
        tracing::info!(session = %id, "session invalidated");
        Ok(())
    }

    /// Invalidates every session owned by `user`.
    ///
    /// Used for security events — most importantly credential rotation,
    /// where every outstanding session must die with the old password.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the store can't perform the bulk delete.
    /// On failure callers must treat the invalidation as NOT guaranteed
    /// and may retry.
    pub async fn invalidate_all(&self, user: &UserId) -> Result<(), StoreError> {
        self.store.delete_all(user).await?;
        tracing::info!(user = %user, "all sessions invalidated");
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for the session lifecycle state machine.
    //!
    //! Naming convention: `test_{function}_{scenario}_{expected}`.
    //!
    //! # Testing time-dependent behavior
    //!
    //! Renewal and expiry depend on wall-clock distances, not on waiting.
    //! Instead of sleeping, tests write records with hand-picked
    //! `expires_at` values straight into the store — "a session with
    //! 10 days left" is just a record whose expiry is 10 days out.
    //!
    //! # Testing store failures
    //!
    //! `FlakyStore` wraps `MemoryStore` and fails selected operations,
    //! exercising each documented fail-closed / best-effort path.

    use chrono::{Duration, Utc};

    use super::*;
    use crate::MemoryStore;

    fn user(id: &str) -> UserId {
        UserId(id.into())
    }

    /// Writes a session with `remaining` left on the clock directly into
    /// the store, bypassing create_session.
    async fn seed_session(
        store: &MemoryStore,
        token: &str,
        owner: &str,
        remaining: Duration,
    ) -> Session {
        let now = Utc::now();
        let session = Session {
            id: SessionId::from_token(token),
            user_id: user(owner),
            created_at: now - Duration::days(1),
            expires_at: now + remaining,
        };
        store.put(&session).await.unwrap();
        session
    }

    // =====================================================================
    // create_session()
    // =====================================================================

    #[tokio::test]
    async fn test_create_session_persists_digest_keyed_record() {
        let lifecycle = SessionLifecycle::new(MemoryStore::new());

        let session = lifecycle
            .create_session("raw-token", user("u1"))
            .await
            .unwrap();

        // The id is the digest, never the raw token.
        assert_eq!(session.id, SessionId::from_token("raw-token"));
        assert_ne!(session.id.as_str(), "raw-token");

        let stored = lifecycle.store().get(&session.id).await.unwrap();
        assert_eq!(stored, Some(session));
    }

    #[tokio::test]
    async fn test_create_session_expiry_is_a_full_lifetime_out() {
        let lifecycle = SessionLifecycle::new(MemoryStore::new());
        let before = Utc::now();

        let session = lifecycle
            .create_session("raw-token", user("u1"))
            .await
            .unwrap();

        let after = Utc::now();
        assert!(session.expires_at >= before + Duration::days(30));
        assert!(session.expires_at <= after + Duration::days(30));
        assert_eq!(session.user_id, user("u1"));
    }

    // =====================================================================
    // validate() — misses and the fail-closed contract
    // =====================================================================

    #[tokio::test]
    async fn test_validate_unknown_token_returns_none() {
        let lifecycle = SessionLifecycle::new(MemoryStore::new());
        assert!(lifecycle.validate("never-issued").await.is_none());
    }

    #[tokio::test]
    async fn test_validate_ownerless_record_returns_none() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .put(&Session {
                id: SessionId::from_token("tok"),
                user_id: UserId(String::new()),
                created_at: now,
                expires_at: now + Duration::days(30),
            })
            .await
            .unwrap();

        let lifecycle = SessionLifecycle::new(store);
        assert!(lifecycle.validate("tok").await.is_none());
    }

    // =====================================================================
    // validate() — renewal behavior
    // =====================================================================

    #[tokio::test]
    async fn test_validate_fresh_session_is_not_renewed() {
        // 20 days remaining is outside the 15-day window: the expiry
        // must come back untouched.
        let store = MemoryStore::new();
        let seeded = seed_session(&store, "tok", "u1", Duration::days(20)).await;
        let lifecycle = SessionLifecycle::new(store);

        let validation = lifecycle.validate("tok").await.expect("session is valid");

        assert_eq!(validation.session.expires_at, seeded.expires_at);
        assert_eq!(validation.user, user("u1"));
    }

    #[tokio::test]
    async fn test_validate_near_expiry_renews_to_a_full_lifetime() {
        // 10 days remaining is inside the window: expiry slides to
        // now + 30 days, in the returned session AND in storage.
        let store = MemoryStore::new();
        seed_session(&store, "tok", "u1", Duration::days(10)).await;
        let lifecycle = SessionLifecycle::new(store);
        let before = Utc::now();

        let validation = lifecycle.validate("tok").await.expect("session is valid");

        assert!(validation.session.expires_at >= before + Duration::days(29));

        let stored = lifecycle
            .store()
            .get(&SessionId::from_token("tok"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.expires_at, validation.session.expires_at);
    }

    #[tokio::test]
    async fn test_validate_renewed_session_is_not_renewed_again() {
        // After one renewal the session is fresh again; an immediate
        // second validation must not write.
        let store = MemoryStore::new();
        seed_session(&store, "tok", "u1", Duration::days(10)).await;
        let lifecycle = SessionLifecycle::new(store);

        let first = lifecycle.validate("tok").await.unwrap();
        let second = lifecycle.validate("tok").await.unwrap();

        assert_eq!(first.session.expires_at, second.session.expires_at);
    }

    // =====================================================================
    // validate() — expiry
    // =====================================================================

    #[tokio::test]
    async fn test_validate_expired_session_returns_none_and_deletes() {
        let store = MemoryStore::new();
        let seeded = seed_session(&store, "tok", "u1", Duration::days(-1)).await;
        let lifecycle = SessionLifecycle::new(store);

        assert!(lifecycle.validate("tok").await.is_none());

        // Expiry detection is lazy but destructive: the record is gone.
        let stored = lifecycle.store().get(&seeded.id).await.unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn test_validate_expired_session_never_renews() {
        // Expired-but-inside-the-window: expiry check must win over the
        // renewal check.
        let store = MemoryStore::new();
        seed_session(&store, "tok", "u1", Duration::seconds(-1)).await;
        let lifecycle = SessionLifecycle::new(store);

        assert!(lifecycle.validate("tok").await.is_none());
        assert!(lifecycle
            .store()
            .get(&SessionId::from_token("tok"))
            .await
            .unwrap()
            .is_none());
    }

    // =====================================================================
    // invalidate() / invalidate_all()
    // =====================================================================

    #[tokio::test]
    async fn test_invalidate_removes_the_session() {
        let lifecycle = SessionLifecycle::new(MemoryStore::new());
        let session = lifecycle.create_session("tok", user("u1")).await.unwrap();

        lifecycle.invalidate(&session.id).await.unwrap();

        assert!(lifecycle.validate("tok").await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_absent_session_is_ok() {
        let lifecycle = SessionLifecycle::new(MemoryStore::new());
        lifecycle
            .invalidate(&SessionId::from_token("ghost"))
            .await
            .expect("idempotent delete");
    }

    #[tokio::test]
    async fn test_invalidate_all_kills_every_session_of_the_user() {
        let lifecycle = SessionLifecycle::new(MemoryStore::new());
        lifecycle.create_session("tok-1", user("alice")).await.unwrap();
        lifecycle.create_session("tok-2", user("alice")).await.unwrap();
        lifecycle.create_session("tok-3", user("bob")).await.unwrap();

        lifecycle.invalidate_all(&user("alice")).await.unwrap();

        assert!(lifecycle.validate("tok-1").await.is_none());
        assert!(lifecycle.validate("tok-2").await.is_none());
        assert!(lifecycle.validate("tok-3").await.is_some());
    }

    // =====================================================================
    // Store-failure paths (FlakyStore)
    // =====================================================================

    /// A store that fails selected operations, for exercising the
    /// fail-closed and best-effort paths.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_put: bool,
        fail_get: bool,
        fail_update: bool,
        fail_delete: bool,
    }

    impl SessionStore for FlakyStore {
        async fn put(&self, session: &Session) -> Result<(), StoreError> {
            if self.fail_put {
                return Err(StoreError::write("put refused"));
            }
            self.inner.put(session).await
        }

        async fn get(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
            if self.fail_get {
                return Err(StoreError::read("get refused"));
            }
            self.inner.get(id).await
        }

        async fn update_expiry(
            &self,
            id: &SessionId,
            expires_at: chrono::DateTime<Utc>,
        ) -> Result<(), StoreError> {
            if self.fail_update {
                return Err(StoreError::write("update refused"));
            }
            self.inner.update_expiry(id, expires_at).await
        }

        async fn delete(&self, id: &SessionId) -> Result<(), StoreError> {
            if self.fail_delete {
                return Err(StoreError::write("delete refused"));
            }
            self.inner.delete(id).await
        }

        async fn delete_all(&self, user: &UserId) -> Result<(), StoreError> {
            self.inner.delete_all(user).await
        }
    }

    #[tokio::test]
    async fn test_create_session_surfaces_store_write_failure() {
        let lifecycle = SessionLifecycle::new(FlakyStore {
            fail_put: true,
            ..Default::default()
        });

        let result = lifecycle.create_session("tok", user("u1")).await;

        assert!(matches!(result, Err(StoreError::Write(_))));
    }

    #[tokio::test]
    async fn test_validate_store_read_failure_fails_closed() {
        let store = FlakyStore {
            fail_get: true,
            ..Default::default()
        };
        seed_session(&store.inner, "tok", "u1", Duration::days(20)).await;
        let lifecycle = SessionLifecycle::new(store);

        // The session exists, but an unreadable store means no access.
        assert!(lifecycle.validate("tok").await.is_none());
    }

    #[tokio::test]
    async fn test_validate_renewal_write_failure_returns_unrenewed_session() {
        let store = FlakyStore {
            fail_update: true,
            ..Default::default()
        };
        let seeded = seed_session(&store.inner, "tok", "u1", Duration::days(10)).await;
        let lifecycle = SessionLifecycle::new(store);

        let validation = lifecycle
            .validate("tok")
            .await
            .expect("still-valid session is returned despite failed renewal");

        // The old expiry stands — it was read before the failed write and
        // stays correct until it naturally passes.
        assert_eq!(validation.session.expires_at, seeded.expires_at);
    }

    #[tokio::test]
    async fn test_validate_expired_session_with_failing_delete_still_returns_none() {
        let store = FlakyStore {
            fail_delete: true,
            ..Default::default()
        };
        seed_session(&store.inner, "tok", "u1", Duration::days(-1)).await;
        let lifecycle = SessionLifecycle::new(store);

        // Returning the stale session would be the worse failure.
        assert!(lifecycle.validate("tok").await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_surfaces_store_failure() {
        let lifecycle = SessionLifecycle::new(FlakyStore {
            fail_delete: true,
            ..Default::default()
        });

        let result = lifecycle.invalidate(&SessionId::from_token("tok")).await;

        assert!(matches!(result, Err(StoreError::Write(_))));
    }
}
