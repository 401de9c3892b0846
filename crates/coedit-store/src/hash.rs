//! Content fingerprints for version records.

use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;

/// Compute SHA-256 hash of content (with Unicode NFC normalization)
pub fn compute_hash(content: &str) -> String {
    let normalized: String = content.nfc().collect();
    let hash = Sha256::digest(normalized.as_bytes());
    format!("{:x}", hash)
}
