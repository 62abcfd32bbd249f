//! Cost parameters for the key-derivation function.

/// Salt length in bytes. 16 bytes (128 bits) is the RFC 9106 recommendation.
pub const SALT_LEN: usize = 16;

/// Derived-key length in bytes.
pub const KEY_LEN: usize = 32;

/// Argon2id cost parameters.
///
/// These control how expensive each hash/verify call is. The defaults are
/// the crate's current recommendation; they are recorded inside every
/// credential string, so changing them here only affects *new* hashes —
/// existing credentials verify under the parameters they were created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    /// Memory cost in KiB. Default: 65536 (64 MiB).
    pub memory_kib: u32,

    /// Number of iterations (passes over the memory). Default: 3.
    pub iterations: u32,

    /// Degree of parallelism (lanes). Default: 2.
    pub parallelism: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024,
            iterations: 3,
            parallelism: 2,
        }
    }
}
