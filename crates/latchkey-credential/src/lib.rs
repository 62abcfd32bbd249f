//! Password hashing and verification for Latchkey.
//!
//! This crate turns a password into an opaque, self-describing credential
//! string — and checks a password against such a string later, possibly
//! years later, possibly under different cost settings than the ones that
//! created it.
//!
//! Three properties carry the security weight:
//!
//! 1. **Memory-hard derivation** (Argon2id). Deriving a key costs tens of
//!    megabytes of RAM and tens of milliseconds of CPU, which is what makes
//!    offline brute-force of a stolen credential table expensive.
//! 2. **Self-describing encoding.** The credential string embeds the
//!    algorithm tag, version, and cost parameters alongside the salt and
//!    derived key. Verification reads the parameters back out of the
//!    string, so credentials hashed under old cost settings keep verifying
//!    after the defaults move.
//! 3. **Constant-time comparison.** The derived key is compared against the
//!    stored key with a fixed-iteration byte accumulate, never a
//!    short-circuiting equality check.
//!
//! Hashing is deliberately slow. Async callers must keep it off the
//! latency-sensitive scheduler — the `latchkey` facade wraps these calls in
//! `tokio::task::spawn_blocking`.

mod error;
mod hasher;
mod params;

pub use error::CredentialError;
pub use hasher::PasswordHasher;
pub use params::{HashParams, KEY_LEN, SALT_LEN};
