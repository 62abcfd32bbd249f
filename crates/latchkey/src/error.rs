//! Unified error type for the Latchkey facade.

use latchkey_credential::CredentialError;
use latchkey_session::StoreError;
use latchkey_token::TokenError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `latchkey` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GatekeeperError {
    /// A credential-level error (malformed hash string, bad parameters,
    /// entropy failure while salting).
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// A token-minting error (entropy failure).
    #[error(transparent)]
    Token(#[from] TokenError),

    /// A session-store error (read or write failure).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The blocking-pool task running a hash or verify never returned —
    /// it panicked or the runtime is shutting down. The operation's
    /// outcome is unknown; treat it as failed.
    #[error("password hashing task did not complete")]
    HashingTaskFailed,
}
