//! ID generation for boards, lists, cards and fields
//!
//! Hash-based IDs so that records created on different machines never clash.
//! Format: <prefix>-xxxxxxxx (8 lowercase alphanumeric chars)

use sha2::{Digest, Sha256};
use uuid::Uuid;

const HASH_CHARS: usize = 8;

/// Generate a unique ID with the given prefix
///
/// Uses UUID + timestamp hash, encoded as base32 lowercase.
pub fn generate_id(prefix: &str) -> String {
    let uuid = Uuid::new_v4();
    let timestamp = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0);

    let mut hasher = Sha256::new();
    hasher.update(uuid.as_bytes());
    hasher.update(timestamp.to_le_bytes());

    let hash = hasher.finalize();

    // 5 bytes = 40 bits = exactly 8 Crockford characters
    let encoded = base32::encode(base32::Alphabet::Crockford, &hash[..5])
        .to_lowercase()
        .chars()
        .take(HASH_CHARS)
        .collect::<String>();

    format!("{}-{}", prefix, encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id() {
        let id = generate_id("card");
        assert!(id.starts_with("card-"));
        assert_eq!(id.len(), 13); // card- + 8 chars
    }

    #[test]
    fn test_generate_id_is_unique() {
        let a = generate_id("board");
        let b = generate_id("board");
        assert_ne!(a, b);
    }
}
