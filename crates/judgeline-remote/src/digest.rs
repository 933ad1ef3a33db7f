use sha2::{Digest, Sha256};

/// Length of a SHA-256 digest in lowercase hex.
pub const HASH_HEX_LEN: usize = 64;

/// A content address must be exactly 64 lowercase hex characters.
pub fn is_valid_hash(hash: &str) -> bool {
    hash.len() == HASH_HEX_LEN
        && hash
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

pub fn sha256_hex_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest() {
        assert_eq!(
            sha256_hex_bytes(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn hash_validation() {
        assert!(is_valid_hash(&sha256_hex_bytes(b"x")));
        assert!(!is_valid_hash(""));
        assert!(!is_valid_hash("../../etc/passwd"));
        assert!(!is_valid_hash(&sha256_hex_bytes(b"x").to_uppercase()));
        assert!(!is_valid_hash(&format!("{}0", sha256_hex_bytes(b"x"))));
    }
}
