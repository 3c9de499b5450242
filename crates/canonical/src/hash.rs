//! Versioned content hash for canonical markup.
//!
//! ```text
//! SHA-256(version.to_be_bytes() || 0x00 || canonical_markup_bytes)
//! ```
//!
//! The version is the parse config version, so a change in parse rules gives
//! every stored document a new hash and the batch can tell stale JSON apart.
//!
//! ```rust
//! use canonical::hash_canonical_bytes;
//!
//! let v1 = hash_canonical_bytes(1, b"<article class=\"legal-document\"></article>");
//! let v2 = hash_canonical_bytes(2, b"<article class=\"legal-document\"></article>");
//! assert_eq!(v1.len(), 64);
//! assert_ne!(v1, v2);
//! ```

use sha2::{Digest, Sha256};

/// Hex SHA-256 of `canonical_bytes` under `canonical_version`.
pub fn hash_canonical_bytes(canonical_version: u32, canonical_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_version.to_be_bytes());
    hasher.update([0]);
    hasher.update(canonical_bytes);
    hex::encode(hasher.finalize())
}
