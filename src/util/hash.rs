//! Content hashing for plan drift detection.
//!
//! The orchestration result embeds a digest of the manifest text so plan
//! consumers can detect that a stored plan no longer matches the manifest
//! it was produced from.

use sha2::{Digest, Sha256};

/// SHA-256 digest of a string, hex-encoded.
pub fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable() {
        assert_eq!(sha256_hex("service: test"), sha256_hex("service: test"));
    }

    #[test]
    fn digest_differs_for_different_content() {
        assert_ne!(sha256_hex("service: a"), sha256_hex("service: b"));
    }

    #[test]
    fn digest_is_hex_encoded_sha256() {
        let digest = sha256_hex("");
        assert_eq!(digest.len(), 64);
        assert_eq!(
            digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
