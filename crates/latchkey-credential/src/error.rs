//! Error types for credential hashing and verification.

/// Errors that can occur while hashing or verifying a password.
///
/// Parsing and cryptographic failures are never silently recovered — a
/// credential string that doesn't parse is a data-integrity problem and
/// should be loud. A *wrong password* is not an error: `verify` returns
/// `Ok(false)` for that.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The credential string doesn't have the expected structure.
    /// Covers missing segments, unparseable cost parameters, and salt/key
    /// segments that aren't valid base64.
    #[error("malformed credential: {0}")]
    Malformed(&'static str),

    /// The credential carries an algorithm tag this crate doesn't handle.
    /// A malformed-credential subtype, split out so operators can tell
    /// "corrupted row" from "row written by other software".
    #[error("unsupported credential algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The credential carries an Argon2 version this crate doesn't handle.
    #[error("unsupported credential version: {0}")]
    UnsupportedVersion(String),

    /// The cost parameters were rejected by the key-derivation function
    /// (out of range, inconsistent with parallelism, etc.).
    #[error("invalid hashing parameters: {0}")]
    BadParams(String),

    /// The operating system's entropy source failed while drawing a salt.
    /// Fatal for the operation — never substitute weak randomness.
    #[error("entropy source failure: {0}")]
    Entropy(String),
}
