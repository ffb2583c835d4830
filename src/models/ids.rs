//! Identifier types and deterministic short hashes.
//!
//! Players, races and regions are open-ended, externally supplied names, so
//! they stay plain strings. Match ids come from the record source (issue
//! numbers or sequential positions).

use sha2::{Digest, Sha256};

/// Player identifier (the name used in match payloads).
pub type PlayerId = String;

/// Race (faction) identifier.
pub type RaceId = String;

/// Region identifier.
pub type RegionId = String;

/// Match identifier carried into player history.
pub type MatchId = u64;

/// Hash input fields with SHA256 and keep the first `len` hex characters.
///
/// Fields are joined with `|` so `["a", "b"]` and `["a|b"]` differ only if
/// the caller lets them; callers pass a single field for file stems.
pub fn short_hash(fields: &[&str], len: usize) -> String {
    let mut hasher = Sha256::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            hasher.update(b"|");
        }
        hasher.update(field.as_bytes());
    }
    let hash = hex::encode(hasher.finalize());
    hash[..len.min(hash.len())].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hash_deterministic() {
        assert_eq!(short_hash(&["Alice"], 8), short_hash(&["Alice"], 8));
    }

    #[test]
    fn test_short_hash_different_inputs() {
        assert_ne!(short_hash(&["a/b"], 8), short_hash(&["a_b"], 8));
    }

    #[test]
    fn test_short_hash_length() {
        assert_eq!(short_hash(&["test", "input"], 8).len(), 8);
        assert_eq!(short_hash(&["test"], 1000).len(), 64);
    }

    #[test]
    fn test_short_hash_hex_format() {
        assert!(short_hash(&["test"], 16)
            .chars()
            .all(|c| c.is_ascii_hexdigit()));
    }
}
