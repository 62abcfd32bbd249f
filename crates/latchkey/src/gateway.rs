//! The `Gatekeeper` facade: one object that runs the whole subsystem.
//!
//! Composes the password hasher, the session lifecycle, and the one-time
//! token store, and adds the one piece none of them should own: keeping
//! the deliberately slow hashing work off the async scheduler.
//!
//! # Why `spawn_blocking`?
//!
//! An Argon2id derivation burns tens of milliseconds of CPU and 64 MiB of
//! RAM. Run inline on a Tokio worker it would stall every
//! other task scheduled on that worker for the duration. The facade moves
//! each hash/verify onto the blocking pool, where long-running CPU work
//! belongs; the hasher itself is shared-nothing, so an abandoned call
//! (client disconnected mid-login) is harmless.

use latchkey_credential::{HashParams, PasswordHasher};
use latchkey_onetime::{OneTimeConfig, OneTimeTokens};
use latchkey_session::{
    Session, SessionConfig, SessionId, SessionLifecycle, SessionStore, UserId, Validation,
};

use crate::GatekeeperError;

/// Builder for configuring a [`Gatekeeper`].
///
/// # Example
///
/// ```rust,no_run
/// use latchkey::prelude::*;
///
/// # async fn setup() {
/// // `build` spawns the sweep task, so it must run inside the runtime.
/// let gate = GatekeeperBuilder::new()
///     .session_config(SessionConfig::default())
///     .one_time_config(OneTimeConfig::default())
///     .build(MemoryStore::new());
/// # gate.shutdown().await;
/// # }
/// ```
pub struct GatekeeperBuilder {
    hash_params: HashParams,
    session_config: SessionConfig,
    one_time_config: OneTimeConfig,
}

impl GatekeeperBuilder {
    /// Creates a builder with default settings everywhere.
    pub fn new() -> Self {
        Self {
            hash_params: HashParams::default(),
            session_config: SessionConfig::default(),
            one_time_config: OneTimeConfig::default(),
        }
    }

    /// Sets the cost parameters for new password hashes.
    pub fn hash_params(mut self, params: HashParams) -> Self {
        self.hash_params = params;
        self
    }

    /// Sets the session lifetime and renewal window.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets the one-time token TTL and sweep interval.
    pub fn one_time_config(mut self, config: OneTimeConfig) -> Self {
        self.one_time_config = config;
        self
    }

    /// Builds the gatekeeper over the given session store.
    ///
    /// Spawns the one-time token sweep task; pair with
    /// [`Gatekeeper::shutdown`] on the way out.
    ///
    /// # Panics
    /// Must be called within a Tokio runtime — spawning the sweep task
    /// panics outside one.
    pub fn build<S: SessionStore>(self, store: S) -> Gatekeeper<S> {
        Gatekeeper {
            hasher: PasswordHasher::with_params(self.hash_params),
            sessions: SessionLifecycle::with_config(store, self.session_config),
            form_tokens: OneTimeTokens::new(self.one_time_config),
        }
    }
}

impl Default for GatekeeperBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A freshly started session, as handed back to the login flow.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// The raw bearer token. Deliver it to the client (cookie, header)
    /// and forget it — it is held nowhere on the server.
    pub token: String,

    /// The persisted session record (digest-keyed).
    pub session: Session,
}

/// The assembled credential-and-session subsystem.
///
/// Construct once at startup, share behind your application state, and
/// [`shutdown`](Self::shutdown) on exit.
pub struct Gatekeeper<S> {
    hasher: PasswordHasher,
    sessions: SessionLifecycle<S>,
    form_tokens: OneTimeTokens,
}

impl<S: SessionStore> Gatekeeper<S> {
    /// Creates a gatekeeper with default settings over the given store.
    ///
    /// Use [`GatekeeperBuilder`] to override hash parameters, session
    /// lifetimes, or one-time token TTLs.
    ///
    /// # Panics
    /// Must be called within a Tokio runtime — the one-time token store's
    /// sweep task is spawned here.
    pub fn new(store: S) -> Self {
        GatekeeperBuilder::new().build(store)
    }

    /// The session lifecycle layer, for callers that need direct access
    /// (e.g. admin tooling listing a user's sessions via the store).
    pub fn sessions(&self) -> &SessionLifecycle<S> {
        &self.sessions
    }

    // -- Credentials ------------------------------------------------------

    /// Hashes a password on the blocking pool.
    ///
    /// Store the returned string with the user profile; it is
    /// self-describing and safe to persist as-is.
    ///
    /// # Errors
    /// [`GatekeeperError::Credential`] for entropy/parameter failures,
    /// [`GatekeeperError::HashingTaskFailed`] if the pool task died.
    pub async fn hash_password(
        &self,
        password: impl Into<String>,
    ) -> Result<String, GatekeeperError> {
        let hasher = self.hasher.clone();
        let password = password.into();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|_| GatekeeperError::HashingTaskFailed)?
            .map_err(GatekeeperError::from)
    }

    /// Verifies a password against a stored credential string, on the
    /// blocking pool.
    ///
    /// Returns `Ok(false)` for a wrong password; errors mean the
    /// credential couldn't be checked at all.
    pub async fn verify_password(
        &self,
        encoded: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<bool, GatekeeperError> {
        let hasher = self.hasher.clone();
        let encoded = encoded.into();
        let password = password.into();
        tokio::task::spawn_blocking(move || hasher.verify(&encoded, &password))
            .await
            .map_err(|_| GatekeeperError::HashingTaskFailed)?
            .map_err(GatekeeperError::from)
    }

    // -- Sessions ---------------------------------------------------------

    /// Starts a session for an authenticated user: mints a bearer token
    /// and persists the digest-keyed record.
    ///
    /// Call after `verify_password` succeeds.
    pub async fn start_session(
        &self,
        user: UserId,
    ) -> Result<IssuedSession, GatekeeperError> {
        let token = latchkey_token::generate_token()?;
        let session = self.sessions.create_session(&token, user).await?;
        Ok(IssuedSession { token, session })
    }

    /// Validates a bearer token from an incoming request.
    ///
    /// `None` means "no access" — absent, expired, and unreadable-store
    /// all produce the same answer, so a response can't be used to probe
    /// which session identifiers were once live.
    pub async fn authenticate(&self, raw_token: &str) -> Option<Validation> {
        self.sessions.validate(raw_token).await
    }

    /// Ends one session (logout).
    pub async fn end_session(&self, id: &SessionId) -> Result<(), GatekeeperError> {
        self.sessions.invalidate(id).await?;
        Ok(())
    }

    /// Ends every session of a user.
    ///
    /// Call on credential rotation: the old password's sessions must not
    /// outlive it.
    pub async fn end_all_sessions(&self, user: &UserId) -> Result<(), GatekeeperError> {
        self.sessions.invalidate_all(user).await?;
        Ok(())
    }

    // -- One-time tokens --------------------------------------------------

    /// Issues a single-use anti-forgery token.
    pub async fn issue_form_token(&self) -> Result<String, GatekeeperError> {
        let token = self.form_tokens.issue().await?;
        Ok(token)
    }

    /// Consumes an anti-forgery token: `true` exactly once per issued
    /// token, `false` for everything else (unknown, expired, replayed).
    pub async fn consume_form_token(&self, token: &str) -> bool {
        self.form_tokens.consume(token).await
    }

    // -- Lifecycle --------------------------------------------------------

    /// Tears the subsystem down: stops the one-time token sweep task.
    pub async fn shutdown(self) {
        self.form_tokens.shutdown().await;
        tracing::debug!("gatekeeper shut down");
    }
}
