//! Content-addressed hashing for deduplication

use sha2::{Digest, Sha256};

/// SHA-256 hex digest of a canonical content string.
pub fn content_hash(canonical: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::content_hash;

    #[test]
    fn hash_is_stable_and_full_length() {
        let a = content_hash("hello");
        assert_eq!(a, content_hash("hello"));
        assert_eq!(a.len(), 64);
        assert_eq!(a, "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824");
    }

    #[test]
    fn different_content_different_hash() {
        assert_ne!(content_hash("Content A"), content_hash("Content B"));
    }
}
