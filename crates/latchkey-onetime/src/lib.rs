//! Single-use anti-forgery tokens for Latchkey.
//!
//! An application hands one of these tokens to a client alongside a form
//! or state-changing endpoint; the client must echo it back, and the echo
//! is only honored once. That "only once" is the entire point: a token
//! that validates twice is a forgery vector.
//!
//! [`OneTimeTokens`] is a reader/writer-locked map from token to expiry
//! deadline, plus a background sweep that evicts entries nobody ever
//! consumed. The sweep is memory hygiene only — `consume` re-checks the
//! deadline itself, so correctness never depends on how recently the
//! sweep ran.
//!
//! # Ownership
//!
//! The store is an explicitly owned component, not ambient global state:
//! construct it once at startup, share it behind your application state,
//! and call [`shutdown`](OneTimeTokens::shutdown) on the way out to stop
//! the sweep task. Dropping the store without a shutdown also stops the
//! sweeper (the shutdown channel closes), just less tidily.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tracing::{debug, warn};

pub use latchkey_token::TokenError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the one-time token store.
#[derive(Debug, Clone, Copy)]
pub struct OneTimeConfig {
    /// How long an issued token stays consumable. Default: 30 minutes.
    pub ttl: Duration,

    /// How often the background sweep evicts expired entries.
    /// Default: 10 minutes. The sweep bounds memory growth from tokens
    /// that were issued but never consumed; shortening it trades a little
    /// lock traffic for a tighter memory bound.
    pub sweep_interval: Duration,
}

impl Default for OneTimeConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(10 * 60),
        }
    }
}

impl OneTimeConfig {
    /// Smallest accepted sweep interval.
    pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(100);

    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`OneTimeTokens::new`]. A zero sweep
    /// interval would spin the sweep task hot; it is raised to
    /// [`Self::MIN_SWEEP_INTERVAL`].
    pub fn validated(mut self) -> Self {
        if self.sweep_interval < Self::MIN_SWEEP_INTERVAL {
            warn!(
                interval_ms = self.sweep_interval.as_millis() as u64,
                "sweep_interval below minimum — clamping"
            );
            self.sweep_interval = Self::MIN_SWEEP_INTERVAL;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// OneTimeTokens
// ---------------------------------------------------------------------------

/// The map type shared between the store handle and its sweep task.
type TokenMap = Arc<RwLock<HashMap<String, Instant>>>;

/// A store of single-use tokens with TTL-based expiry.
///
/// Reads could proceed concurrently under the reader half of the lock,
/// but the one operation that matters — [`consume`](Self::consume) — is a
/// check-then-delete and therefore takes the writer half, making it
/// atomic: of two racing consumers of the same token, exactly one wins.
pub struct OneTimeTokens {
    tokens: TokenMap,
    ttl: Duration,
    sweeper: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl OneTimeTokens {
    /// Creates the store and spawns its sweep task.
    ///
    /// # Panics
    /// Must be called within a Tokio runtime — the sweep task is spawned
    /// here, and `tokio::spawn` panics outside one.
    pub fn new(config: OneTimeConfig) -> Self {
        let config = config.validated();
        let tokens: TokenMap = Arc::new(RwLock::new(HashMap::new()));
        let (shutdown, shutdown_rx) = watch::channel(false);

        let sweeper =
            spawn_sweeper(Arc::clone(&tokens), config.sweep_interval, shutdown_rx);

        debug!(
            ttl_secs = config.ttl.as_secs(),
            sweep_secs = config.sweep_interval.as_secs(),
            "one-time token store created"
        );

        Self {
            tokens,
            ttl: config.ttl,
            sweeper,
            shutdown,
        }
    }

    /// Issues a fresh token, valid for the configured TTL.
    ///
    /// # Errors
    /// Returns [`TokenError::Entropy`] if the OS random source fails —
    /// no token is recorded in that case.
    pub async fn issue(&self) -> Result<String, TokenError> {
        let token = latchkey_token::generate_token()?;
        let deadline = Instant::now() + self.ttl;
        self.tokens.write().await.insert(token.clone(), deadline);
        Ok(token)
    }

    /// Consumes a token: returns `true` exactly once per issued token.
    ///
    /// Under the exclusive lock, the token must be present AND unexpired;
    /// it is then removed in the same critical section. A second call
    /// with the same token — or a call racing this one — returns `false`.
    /// An expired entry returns `false` and is left for the sweep.
    pub async fn consume(&self, token: &str) -> bool {
        let mut tokens = self.tokens.write().await;
        match tokens.get(token) {
            Some(&deadline) if Instant::now() < deadline => {
                tokens.remove(token);
                true
            }
            _ => false,
        }
    }

    /// Number of entries currently held, including expired ones the sweep
    /// hasn't evicted yet.
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    /// Returns `true` if no entries are held.
    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }

    /// Stops the sweep task and waits for it to finish.
    ///
    /// The store is consumed: after shutdown there is nothing left to
    /// issue or consume against.
    pub async fn shutdown(self) {
        // Receiver sees the send (or the sender drop) and exits the loop.
        let _ = self.shutdown.send(true);
        let _ = self.sweeper.await;
    }
}

/// Spawns the periodic eviction task.
///
/// Runs until the shutdown channel fires or the store handle is dropped
/// (which closes the channel). Each pass takes the exclusive lock once
/// and retains only unexpired entries.
fn spawn_sweeper(
    tokens: TokenMap,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    sweep(&tokens).await;
                }
                // Resolves on shutdown() AND on an Err from the sender
                // being dropped — either way, time to stop.
                _ = shutdown_rx.changed() => break,
            }
        }

        debug!("one-time token sweeper stopped");
    })
}

/// Evicts every expired entry under the exclusive lock.
async fn sweep(tokens: &TokenMap) {
    let now = Instant::now();
    let mut tokens = tokens.write().await;
    let before = tokens.len();
    tokens.retain(|_, deadline| now < *deadline);
    let evicted = before - tokens.len();

    if evicted > 0 {
        debug!(evicted, remaining = tokens.len(), "evicted expired one-time tokens");
    }
}

// =========================================================================
// Tests
// =========================================================================
