//! Token minting for Latchkey: opaque bearer secrets and the one-way
//! identifiers derived from them.
//!
//! Two operations live here, and the split between them is the whole
//! security story of the session layer:
//!
//! 1. [`generate_token`] — mints a random secret. This string goes to the
//!    client (a cookie, a response header) and NOWHERE else.
//! 2. [`derive_identifier`] — computes a SHA-256 digest of that secret.
//!    The digest is what gets written to storage, logged, and used as the
//!    lookup key.
//!
//! Because the digest is one-way, a leaked session table cannot be replayed
//! as live sessions: an attacker holding the digests still can't produce
//! the bearer tokens that hash to them. And because the digest is
//! deterministic, lookup stays a plain equality match — no scanning, no
//! per-row comparison work.
//!
//! ```text
//! client holds:   "k7f2..." (raw token, 32 base32 chars)
//!                     │ derive_identifier()
//!                     ▼
//! storage holds:  "9c41..." (SHA-256 digest, 64 hex chars)
//! ```

use rand::TryRngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// How many random bytes go into a token: 20 bytes = 160 bits.
///
/// 160 bits is far beyond brute-force range, and it's an exact multiple of
/// the 5 bits-per-character that base32 encodes, so tokens never need
/// padding characters.
pub const TOKEN_BYTES: usize = 20;

/// Length of an encoded token in characters (160 bits / 5 bits per char).
pub const TOKEN_LEN: usize = 32;

/// Length of a derived identifier in characters (32-byte digest as hex).
pub const IDENTIFIER_LEN: usize = 64;

/// The RFC 4648 base32 alphabet, lowercased.
///
/// Lowercase keeps tokens case-insensitive-safe in transports that fold
/// case (some cookie jars, DNS-ish contexts), and the alphabet contains no
/// characters that need URL escaping.
const TOKEN_ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

/// Errors from token minting.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The operating system's entropy source failed.
    ///
    /// This is fatal for the operation. A token minted from anything
    /// weaker than the OS CSPRNG would be guessable, so there is no
    /// fallback path.
    #[error("entropy source failure: {0}")]
    Entropy(String),
}

/// Mints a fresh bearer token: 160 bits from the OS CSPRNG, base32-encoded.
///
/// The result is always [`TOKEN_LEN`] printable characters from
/// [`TOKEN_ALPHABET`]. Used both for session bearer tokens and for
/// one-time anti-forgery tokens.
///
/// # Errors
/// Returns [`TokenError::Entropy`] if the OS random source fails. Callers
/// must abort the operation — never retry with weaker randomness.
pub fn generate_token() -> Result<String, TokenError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| TokenError::Entropy(e.to_string()))?;
    Ok(encode_base32(&bytes))
}

/// Derives the storage identifier for a token: SHA-256, lowercase hex.
///
/// Deterministic — the same token always yields the same identifier, which
/// is what makes digest-keyed lookup possible. The digest is safe to store
/// and log; the token itself is not.
pub fn derive_identifier(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(digest)
}

/// Encodes bytes in lowercase base32 without padding.
///
/// Standard 5-bit chunking: accumulate bits, emit a character whenever at
/// least 5 are buffered. For [`TOKEN_BYTES`] input the bit count divides
/// evenly, so the tail branch never fires for our own tokens — it's kept
/// so the function is correct for any input length.
fn encode_base32(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(5) * 8);
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;

    for &b in bytes {
        acc = (acc << 8) | u32::from(b);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(TOKEN_ALPHABET[((acc >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(TOKEN_ALPHABET[((acc << (5 - bits)) & 0x1f) as usize] as char);
    }

    out
}

// =========================================================================
// Tests
// =========================================================================
