//! API key generation.
//!
//! Keys are 16 bytes drawn from the operating system's CSPRNG and
//! hex-encoded, giving a fixed 32-character string with 128 bits of
//! entropy. Collisions across the lifetime of the store are negligible.

use rand::rngs::OsRng;
use rand::RngCore;

/// Number of random bytes backing each key.
const KEY_BYTES: usize = 16;

/// Generator for unique, unguessable API keys.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyGenerator;

impl ApiKeyGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Produces a fresh 32-character hex key.
    pub fn generate(&self) -> String {
        let mut bytes = [0u8; KEY_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}
