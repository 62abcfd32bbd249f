//! Session lifecycle management for Latchkey.
//!
//! This crate handles the server-side record of a logged-in user:
//!
//! 1. **Identity** — a session is keyed by the one-way digest of its
//!    bearer token, never by the token itself ([`SessionId`])
//! 2. **Storage contract** — five operations any backing store must
//!    provide ([`SessionStore`]), plus an in-memory reference
//!    implementation ([`MemoryStore`])
//! 3. **Lifecycle** — creation, validation with sliding renewal, and
//!    invalidation ([`SessionLifecycle`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Gatekeeper facade (above)  ← mints tokens, runs login/logout flows
//!     ↕
//! Session layer (this crate) ← owns the validity/renewal state machine
//!     ↕
//! Token layer (below)        ← provides generate_token / derive_identifier
//! ```
//!
//! # Failure philosophy
//!
//! `validate` fails closed: a store that can't be read, a record that
//! can't be found, and a session past its expiry all produce the same
//! empty answer. Callers cannot distinguish "never existed" from
//! "expired" — deliberately, so responses don't leak which session
//! identifiers were once live.

mod error;
mod manager;
mod session;
mod store;

pub use error::StoreError;
pub use manager::{SessionLifecycle, Validation};
pub use session::{Session, SessionConfig, SessionId, UserId};
pub use store::{MemoryStore, SessionStore};
