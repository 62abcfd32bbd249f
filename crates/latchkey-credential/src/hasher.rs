//! The password hasher: Argon2id derivation plus the encoded-string format.
//!
//! # Encoded credential format
//!
//! One printable string carries everything verification needs:
//!
//! ```text
//! $argon2id$v=19$m=65536,t=3,p=2$<base64 salt>$<base64 key>
//!  ────┬───  ─┬── ──────┬──────── ─────┬────── ─────┬─────
//!      │      │         │              │            └ derived key
//!      │      │         │              └ random salt
//!      │      │         └ cost parameters (KiB, passes, lanes)
//!      │      └ Argon2 version (19 = 0x13)
//!      └ algorithm tag
//! ```
//!
//! Salt and key use the standard base64 alphabet without padding. The
//! string is versioned data: `verify` re-derives with the parameters it
//! parses out of the string, never with the current defaults.

use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::{CredentialError, HashParams, KEY_LEN, SALT_LEN};

/// The only algorithm tag this crate mints or accepts.
const ALGORITHM_TAG: &str = "argon2id";

/// Hashes passwords into self-describing credential strings and verifies
/// passwords against them.
///
/// Holds nothing but cost parameters — no shared state, so a single
/// instance can be shared freely across threads, and an abandoned call
/// (caller disconnected mid-hash) corrupts nothing.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher {
    params: HashParams,
}

impl PasswordHasher {
    /// Creates a hasher with the default cost parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a hasher with explicit cost parameters.
    ///
    /// Used for cost migration: new hashes pick up the new parameters
    /// while old credentials keep verifying, because verification reads
    /// parameters from the credential string itself.
    pub fn with_params(params: HashParams) -> Self {
        Self { params }
    }

    /// Hashes a password into an encoded credential string.
    ///
    /// Draws a fresh [`SALT_LEN`]-byte salt from the OS CSPRNG on every
    /// call, so hashing the same password twice yields different strings
    /// that both verify.
    ///
    /// # Errors
    /// - [`CredentialError::Entropy`] — the OS random source failed.
    /// - [`CredentialError::BadParams`] — the configured cost parameters
    ///   were rejected by the key-derivation function.
    pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
        let mut salt = [0u8; SALT_LEN];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| CredentialError::Entropy(e.to_string()))?;

        let mut key = [0u8; KEY_LEN];
        derive_key(password.as_bytes(), &salt, self.params, &mut key)?;

        Ok(format!(
            "${ALGORITHM_TAG}$v={}$m={},t={},p={}${}${}",
            Version::V0x13 as u32,
            self.params.memory_kib,
            self.params.iterations,
            self.params.parallelism,
            STANDARD_NO_PAD.encode(salt),
            STANDARD_NO_PAD.encode(key),
        ))
    }

    /// Verifies a password against an encoded credential string.
    ///
    /// Parses the algorithm tag, version, cost parameters, salt, and
    /// stored key out of the string, re-derives a key from `password`
    /// under the *parsed* parameters, and compares the two keys in
    /// constant time.
    ///
    /// Returns `Ok(false)` for a wrong password. Errors are reserved for
    /// credentials that can't be checked at all.
    ///
    /// # Errors
    /// - [`CredentialError::Malformed`] — structure, cost segment, or
    ///   base64 segments don't parse.
    /// - [`CredentialError::UnsupportedAlgorithm`] /
    ///   [`CredentialError::UnsupportedVersion`] — recognizably foreign.
    /// - [`CredentialError::BadParams`] — parsed parameters rejected by
    ///   the key-derivation function.
    pub fn verify(&self, encoded: &str, password: &str) -> Result<bool, CredentialError> {
        let parsed = ParsedCredential::parse(encoded)?;

        // The stored key's length dictates the derived length, so
        // credentials minted with a different output size still verify.
        let mut derived = vec![0u8; parsed.key.len()];
        derive_key(password.as_bytes(), &parsed.salt, parsed.params, &mut derived)?;

        Ok(constant_time_eq(&derived, &parsed.key))
    }
}

/// A credential string broken into its verified-format pieces.
struct ParsedCredential {
    params: HashParams,
    salt: Vec<u8>,
    key: Vec<u8>,
}

impl ParsedCredential {
    fn parse(encoded: &str) -> Result<Self, CredentialError> {
        // "$argon2id$v=19$m=..,t=..,p=..$salt$key" splits into six parts,
        // the first of which is the empty string before the leading '$'.
        let parts: Vec<&str> = encoded.split('$').collect();
        let [empty, algorithm, version, costs, salt, key] = parts.as_slice() else {
            return Err(CredentialError::Malformed(
                "credential must have 6 '$'-separated fields",
            ));
        };
        if !empty.is_empty() {
            return Err(CredentialError::Malformed("missing leading '$'"));
        }

        if *algorithm != ALGORITHM_TAG {
            return Err(CredentialError::UnsupportedAlgorithm(algorithm.to_string()));
        }

        let version_num: u32 = version
            .strip_prefix("v=")
            .and_then(|v| v.parse().ok())
            .ok_or(CredentialError::Malformed("version segment must be v=<n>"))?;
        if version_num != Version::V0x13 as u32 {
            return Err(CredentialError::UnsupportedVersion(version_num.to_string()));
        }

        let params = parse_costs(costs)?;

        let salt = STANDARD_NO_PAD
            .decode(salt)
            .map_err(|_| CredentialError::Malformed("salt segment is not valid base64"))?;
        let key = STANDARD_NO_PAD
            .decode(key)
            .map_err(|_| CredentialError::Malformed("key segment is not valid base64"))?;

        Ok(Self { params, salt, key })
    }
}

/// Parses the `m=<kib>,t=<iterations>,p=<parallelism>` cost segment.
fn parse_costs(segment: &str) -> Result<HashParams, CredentialError> {
    let mut fields = segment.split(',');

    let mut take = |prefix: &'static str| -> Result<u32, CredentialError> {
        fields
            .next()
            .and_then(|f| f.strip_prefix(prefix))
            .and_then(|v| v.parse().ok())
            .ok_or(CredentialError::Malformed(
                "cost segment must be m=<n>,t=<n>,p=<n>",
            ))
    };

    let memory_kib = take("m=")?;
    let iterations = take("t=")?;
    let parallelism = take("p=")?;

    if fields.next().is_some() {
        return Err(CredentialError::Malformed(
            "cost segment must be m=<n>,t=<n>,p=<n>",
        ));
    }

    Ok(HashParams {
        memory_kib,
        iterations,
        parallelism,
    })
}

/// Runs the Argon2id key derivation into `out`.
fn derive_key(
    password: &[u8],
    salt: &[u8],
    params: HashParams,
    out: &mut [u8],
) -> Result<(), CredentialError> {
    let params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(out.len()),
    )
    .map_err(|e| CredentialError::BadParams(e.to_string()))?;

    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(password, salt, out)
        .map_err(|e| CredentialError::BadParams(e.to_string()))
}

/// Compares two byte slices in constant time.
///
/// Fixed-iteration XOR/OR accumulation — every byte is visited regardless
/// of where the first mismatch sits, so timing reveals nothing about how
/// much of the key matched. A data-dependent early exit here would be a
/// timing side channel, not a style choice.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

// =========================================================================
// Tests
// =========================================================================
