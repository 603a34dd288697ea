//! Hashing - SHA-256 Manifest Digests
//!
//! The digest covers the manifest text exactly as written to disk, so two
//! runs can be compared by digest instead of diffing files.

use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Digest of rendered manifest text
pub fn manifest_digest(manifest_json: &str) -> String {
    sha256_hex(manifest_json.as_bytes())
}
