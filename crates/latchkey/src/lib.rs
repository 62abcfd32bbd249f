//! # Latchkey
//!
//! Credential and session security for backends that keep everything else
//! boring.
//!
//! Latchkey covers the one subsystem of a CRUD backend that carries real
//! security risk: how passwords are hashed and verified, how opaque
//! session tokens are minted and matched against storage without ever
//! persisting the secret itself, how sessions expire and silently renew,
//! and how short-lived anti-forgery tokens are issued and consumed
//! exactly once under concurrent access.
//!
//! The [`Gatekeeper`] facade ties the layers together; each layer is also
//! usable on its own:
//!
//! ```text
//! Gatekeeper (this crate)      ← login/logout flows, blocking-pool hashing
//!     ↕
//! latchkey-session             ← lifecycle state machine over a store contract
//! latchkey-onetime             ← single-use tokens + background sweep
//!     ↕
//! latchkey-credential          ← Argon2id hashing, self-describing strings
//! latchkey-token               ← token minting, one-way identifiers
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use latchkey::prelude::*;
//!
//! # async fn demo() -> Result<(), GatekeeperError> {
//! let gate = Gatekeeper::new(MemoryStore::new());
//!
//! // Registration: store `credential` with the user profile.
//! let credential = gate.hash_password("correct horse battery staple").await?;
//!
//! // Login: check the password, then start a session. The raw token in
//! // `issued.token` goes to the client (e.g. a cookie); only its digest
//! // is ever stored.
//! assert!(gate.verify_password(credential, "correct horse battery staple").await?);
//! let issued = gate.start_session(UserId("user-1".into())).await?;
//!
//! // Every authenticated request:
//! let validation = gate.authenticate(&issued.token).await;
//! assert!(validation.is_some());
//!
//! // Logout:
//! gate.end_session(&issued.session.id).await?;
//! gate.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod error;
mod gateway;

pub use error::GatekeeperError;
pub use gateway::{Gatekeeper, GatekeeperBuilder, IssuedSession};

/// Everything most applications need, one `use` away.
pub mod prelude {
    pub use crate::{Gatekeeper, GatekeeperBuilder, GatekeeperError, IssuedSession};
    pub use latchkey_credential::{CredentialError, HashParams, PasswordHasher};
    pub use latchkey_onetime::{OneTimeConfig, OneTimeTokens};
    pub use latchkey_session::{
        MemoryStore, Session, SessionConfig, SessionId, SessionLifecycle, SessionStore,
        StoreError, UserId, Validation,
    };
    pub use latchkey_token::{TokenError, derive_identifier, generate_token};
}
