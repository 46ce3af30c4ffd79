//! Content-addressed hashing.

use sha2::{Digest, Sha256};

/// SHA-256 hex digest of the UTF-8 bytes of `content`.
pub fn compute_content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_for_identical_content() {
        assert_eq!(compute_content_hash("hello"), compute_content_hash("hello"));
    }

    #[test]
    fn hash_changes_on_single_byte_difference() {
        assert_ne!(compute_content_hash("hello"), compute_content_hash("hellp"));
    }

    #[test]
    fn hash_is_64_hex_chars() {
        let digest = compute_content_hash("anything");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
