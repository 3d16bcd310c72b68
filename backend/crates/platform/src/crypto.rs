//! Cryptographic Utilities

use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Draw `len` characters uniformly from `charset` using the OS CSPRNG.
///
/// Rejection sampling: bytes at or above the largest multiple of
/// `charset.len()` are discarded, so no character is favored by the
/// `256 % charset.len()` remainder.
///
/// # Panics
/// Panics if `charset` is empty or longer than 256 entries.
pub fn random_charset_string(charset: &[u8], len: usize) -> String {
    assert!(
        !charset.is_empty() && charset.len() <= 256,
        "charset must have 1..=256 entries"
    );

    let bound = (256 / charset.len()) * charset.len();
    let mut out = Vec::with_capacity(len);

    while out.len() < len {
        for byte in random_bytes(len - out.len() + 8) {
            if (byte as usize) < bound {
                out.push(charset[byte as usize % charset.len()]);
                if out.len() == len {
                    break;
                }
            }
        }
    }

    // charset entries are ASCII in every caller; invalid UTF-8 is impossible
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_bytes() {
        let bytes = random_bytes(32);
        assert_eq!(bytes.len(), 32);
        // Should not be all zeros (statistically)
        assert!(bytes.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_sha256_known_values() {
        // SHA-256 of empty string
        let hash = sha256(b"");
        let expected =
            hex::decode("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
                .unwrap();
        assert_eq!(hash.to_vec(), expected);

        // SHA-256 of "hello"
        let hash = sha256(b"hello");
        let expected =
            hex::decode("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")
                .unwrap();
        assert_eq!(hash.to_vec(), expected);
    }

    #[test]
    fn test_random_charset_string_length_and_membership() {
        let charset = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

        for len in [0, 1, 8, 64] {
            let s = random_charset_string(charset, len);
            assert_eq!(s.len(), len);
            assert!(s.bytes().all(|b| charset.contains(&b)));
        }
    }

    #[test]
    fn test_random_charset_string_varies() {
        let charset = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
        let a = random_charset_string(charset, 32);
        let b = random_charset_string(charset, 32);
        assert_ne!(a, b, "two 32-char draws should differ");
    }

    #[test]
    fn test_random_charset_string_covers_tail() {
        // A charset of 36 leaves 256 % 36 = 4 rejected byte values; the
        // last characters must still appear over enough draws.
        let charset = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
        let sample = random_charset_string(charset, 4096);
        assert!(sample.contains('9'));
        assert!(sample.contains('A'));
    }
}
