//! Domain Services
//!
//! Pure domain logic for minting and matching unlock codes.

use crate::domain::value_objects::CodeDigest;

/// Characters an unlock code may contain
pub const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Separator between code groups, e.g. `ABCD-1234`
pub const CODE_GROUP_SEPARATOR: char = '-';

/// Mint a human-readable plaintext code, e.g. `XK3A-9F2M`
pub fn generate_plain_code(group_count: usize, group_len: usize) -> String {
    let groups: Vec<String> = (0..group_count)
        .map(|_| platform::crypto::random_charset_string(CODE_CHARSET, group_len))
        .collect();
    groups.join(&CODE_GROUP_SEPARATOR.to_string())
}

/// Canonical form of a submitted code: uppercase, separators and
/// whitespace stripped
///
/// Applied identically at mint time and at redemption lookup time;
/// the digest is always computed over this form.
pub fn normalize_code(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// SHA-256 digest over the normalized code
pub fn code_digest(raw: &str) -> CodeDigest {
    CodeDigest::from(platform::crypto::sha256(normalize_code(raw).as_bytes()))
}
