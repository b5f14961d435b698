//! SHA-256 checksums in the canonical `sha256:<hex>` format
//!
//! [`Checksum`] hashes structured content incrementally: each field is
//! length-prefixed so that `("ab", "c")` and `("a", "bc")` never collide.

use sha2::{Digest, Sha256};

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Incremental checksum over a sequence of fields.
#[derive(Debug, Clone, Default)]
pub struct Checksum {
    hasher: Sha256,
}

impl Checksum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one length-prefixed field.
    pub fn field(&mut self, value: &str) -> &mut Self {
        self.hasher.update((value.len() as u64).to_le_bytes());
        self.hasher.update(value.as_bytes());
        self
    }

    /// Feed a tag byte separating groups of fields.
    pub fn tag(&mut self, tag: u8) -> &mut Self {
        self.hasher.update([tag]);
        self
    }

    pub fn finish(self) -> String {
        format!("{}{:x}", PREFIX, self.hasher.finalize())
    }
}
