//! Short digests for cache keys.

use sha2::{Digest, Sha256};

/// Number of SHA-256 bytes kept in a digest (hex output is twice as long).
pub const DIGEST_BYTES: usize = 16;

/// Digest an ordered list of strings.
///
/// Each part is length-prefixed, so `["ab", "c"]` and `["a", "bc"]` differ.
pub fn digest<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    for part in parts {
        let bytes = part.as_ref().as_bytes();
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    }
    let hash = hasher.finalize();
    hex::encode(&hash[..DIGEST_BYTES])
}
