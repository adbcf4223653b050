//! Content addressing and stable hashing.
//!
//! Chunk text is keyed by the SHA-256 of its canonical form; run outputs are
//! fingerprinted with BLAKE3.

use sha2::{Digest, Sha256};

/// Canonical form of a passage: surrounding whitespace trimmed, lower-cased.
#[inline]
pub fn canonicalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// SHA-256 (hex) of the canonical form of `text`.
///
/// This is the cache key and the per-document deduplication key.
#[inline]
pub fn content_hash(text: &str) -> String {
    hash_canonical(&canonicalize(text))
}

/// SHA-256 (hex) of text that is already canonical.
#[inline]
pub fn hash_canonical(canonical: &str) -> String {
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

/// BLAKE3 (hex) over raw bytes. Used for stable run fingerprints.
#[inline]
pub fn stable_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Computes a 64-bit value from the first 8 bytes of a BLAKE3 hash.
///
/// Only used to seed deterministic generators; never as an identity.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(bytes)
}

/// File-system safe slug for a model id (used as the cache sub-directory).
pub fn model_slug(model_id: &str) -> String {
    let slug: String = model_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    // Distinct ids can slug identically ("a/b" vs "a_b"); suffix disambiguates.
    format!("{}-{:016x}", slug, hash_to_u64(model_id.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_trims_and_lowercases() {
        assert_eq!(canonicalize("  Climate RISK \n"), "climate risk");
        assert_eq!(canonicalize(""), "");
    }

    #[test]
    fn test_content_hash_is_canonical() {
        assert_eq!(content_hash("Climate Risk"), content_hash("  climate risk  "));
        assert_ne!(content_hash("climate risk"), content_hash("climate  risk"));
    }

    #[test]
    fn test_content_hash_known_vector() {
        // sha256("abc")
        assert_eq!(
            content_hash("ABC"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_content_hash_output_size() {
        assert_eq!(content_hash("scope 3 emissions").len(), 64);
    }

    #[test]
    fn test_stable_hash_determinism() {
        let a = stable_hash(b"{\"k\":1}");
        let b = stable_hash(b"{\"k\":1}");
        assert_eq!(a, b);
        assert_ne!(a, stable_hash(b"{\"k\":2}"));
    }

    #[test]
    fn test_model_slug_is_path_safe() {
        let slug = model_slug("openai/text-embedding-3-small");
        assert!(!slug.contains('/'));
        assert!(slug.starts_with("openai_text-embedding-3-small-"));
        assert_ne!(model_slug("a/b"), model_slug("a_b"));
    }
}
