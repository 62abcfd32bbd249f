//! Session types: the data structures that represent a logged-in user.
//!
//! A "session" is the server's record of an authenticated user. It tracks:
//! - WHO the session belongs to (`UserId`)
//! - HOW it is looked up (`SessionId` — the digest of the bearer token)
//! - WHEN it was created and when it stops being valid
//!
//! The bearer token itself appears nowhere in these types. The client
//! holds it; the server holds only the digest.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The storage identifier of a session: the SHA-256 digest of its bearer
/// token, as 64 lowercase hex characters.
///
/// A newtype wrapper so a session identifier can't be confused with a raw
/// token (or a user identifier) at a function boundary. Safe to store,
/// log, and display — it cannot be turned back into the token.
///
/// `#[serde(transparent)]` serializes this as the plain string, which is
/// what storage backends expect for a key column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Derives the identifier for a raw bearer token.
    ///
    /// This is the ONLY bridge between a token and its storage key.
    /// Deterministic: the same token always maps to the same identifier,
    /// so lookup is a plain equality match.
    pub fn from_token(raw_token: &str) -> Self {
        Self(latchkey_token::derive_identifier(raw_token))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for a user, opaque to this crate.
///
/// The session layer never interprets it — it only stores it with each
/// session and hands it back on validation, so callers can load the
/// profile from wherever profiles live.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session lifetimes and renewal.
///
/// The two durations together define the sliding-expiry behavior: a
/// session lives `lifetime` from its last renewal, and any validation
/// inside the final `renewal_window` slides the expiry forward to a full
/// `lifetime` again. With the defaults (30 d / 15 d) an active user stays
/// logged in indefinitely at a cost of at most one extra store write per
/// 15 days, while an abandoned session dies at most 30 days after last
/// use.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// How long a session is valid after creation or renewal.
    /// Default: 30 days.
    pub lifetime: Duration,

    /// Validations closer to expiry than this trigger a renewal.
    /// Default: 15 days. Set to `Duration::zero()` to disable sliding
    /// renewal entirely (sessions then expire a fixed `lifetime` after
    /// creation).
    pub renewal_window: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lifetime: Duration::days(30),
            renewal_window: Duration::days(15),
        }
    }
}

impl SessionConfig {
    /// Clamps any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by
    /// [`SessionLifecycle::with_config`](crate::SessionLifecycle::with_config).
    /// Rules:
    /// - negative durations are raised to zero
    /// - `renewal_window` is capped at `lifetime` (a window larger than
    ///   the lifetime would renew on every single validation)
    pub fn validated(mut self) -> Self {
        if self.lifetime < Duration::zero() {
            self.lifetime = Duration::zero();
        }
        if self.renewal_window < Duration::zero() {
            self.renewal_window = Duration::zero();
        }
        if self.renewal_window > self.lifetime {
            tracing::warn!(
                window_secs = self.renewal_window.num_seconds(),
                lifetime_secs = self.lifetime.num_seconds(),
                "renewal_window exceeds lifetime — clamping"
            );
            self.renewal_window = self.lifetime;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A single user's session record.
///
/// Created at login, persisted keyed by `id`, deleted on logout, bulk
/// invalidation, or expiry detection. Timestamps are wall-clock UTC
/// because the expiry must survive process restarts and travel through
/// storage — a monotonic clock can do neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Digest of the bearer token. The storage key.
    pub id: SessionId,

    /// The user this session belongs to.
    pub user_id: UserId,

    /// When the session was created.
    pub created_at: DateTime<Utc>,

    /// The absolute instant at which the session stops being valid.
    /// May slide forward on validation (see [`SessionConfig`]).
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session is expired as of `now`.
    ///
    /// Expiry is inclusive: a session whose `expires_at` equals `now` is
    /// already dead.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Tests for session types, identifiers, and config clamping.
    //!
    //! Naming convention: `test_{function}_{scenario}_{expected}`.

    use super::*;

    // =====================================================================
    // SessionId
    // =====================================================================

    #[test]
    fn test_from_token_is_digest_not_token() {
        let id = SessionId::from_token("my-raw-token");
        assert_ne!(id.as_str(), "my-raw-token");
        assert_eq!(id.as_str().len(), latchkey_token::IDENTIFIER_LEN);
        assert_eq!(id.as_str(), latchkey_token::derive_identifier("my-raw-token"));
    }

    #[test]
    fn test_from_token_is_deterministic() {
        assert_eq!(
            SessionId::from_token("tok"),
            SessionId::from_token("tok")
        );
        assert_ne!(
            SessionId::from_token("tok-a"),
            SessionId::from_token("tok-b")
        );
    }

    #[test]
    fn test_session_id_serializes_as_plain_string() {
        // `#[serde(transparent)]` — the storage key column is a string,
        // not a one-field object.
        let id = SessionId("abc123".into());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123\"");
    }

    #[test]
    fn test_user_id_serializes_as_plain_string() {
        let user = UserId("user-7".into());
        assert_eq!(serde_json::to_string(&user).unwrap(), "\"user-7\"");
    }

    // =====================================================================
    // SessionConfig
    // =====================================================================

    #[test]
    fn test_default_config_is_thirty_and_fifteen_days() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.lifetime, Duration::days(30));
        assert_eq!(cfg.renewal_window, Duration::days(15));
    }

    #[test]
    fn test_validated_clamps_window_to_lifetime() {
        let cfg = SessionConfig {
            lifetime: Duration::days(10),
            renewal_window: Duration::days(20),
        }
        .validated();
        assert_eq!(cfg.renewal_window, cfg.lifetime);
    }

    #[test]
    fn test_validated_raises_negative_durations_to_zero() {
        let cfg = SessionConfig {
            lifetime: Duration::days(-1),
            renewal_window: Duration::days(-2),
        }
        .validated();
        assert_eq!(cfg.lifetime, Duration::zero());
        assert_eq!(cfg.renewal_window, Duration::zero());
    }

    // =====================================================================
    // Session
    // =====================================================================

    #[test]
    fn test_is_expired_at_boundary_is_inclusive() {
        let now = Utc::now();
        let session = Session {
            id: SessionId::from_token("t"),
            user_id: UserId("u".into()),
            created_at: now,
            expires_at: now,
        };
        assert!(session.is_expired_at(now));
        assert!(session.is_expired_at(now + Duration::seconds(1)));
        assert!(!session.is_expired_at(now - Duration::seconds(1)));
    }

    #[test]
    fn test_session_serde_round_trip() {
        let now = Utc::now();
        let session = Session {
            id: SessionId::from_token("t"),
            user_id: UserId("u-1".into()),
            created_at: now,
            expires_at: now + Duration::days(30),
        };
        let json = serde_json::to_string(&session).unwrap();
        let decoded: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(session, decoded);
    }
}
