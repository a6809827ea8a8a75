use sha2::{Digest, Sha256};

use crate::codec::SecretBytes;
use crate::models::SecretHash;

/// SHA-256 over the raw secret bytes, not their text encoding.
pub fn hash_secret(secret: &SecretBytes) -> SecretHash {
    let digest = Sha256::digest(secret);
    SecretHash::from_bytes(digest.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::SECRET_LEN;

    #[test]
    fn test_hash_of_zero_secret() {
        let hash = hash_secret(&[0u8; SECRET_LEN]);
        assert_eq!(
            hex::encode(hash.as_bytes()),
            "0d5535e13cc9708d0ff0289af2fae27e564b6bcbcd9242f5140d96957744a517"
        );
    }

    #[test]
    fn test_distinct_secrets_distinct_hashes() {
        let mut other = [0u8; SECRET_LEN];
        other[SECRET_LEN - 1] = 1;
        assert_ne!(hash_secret(&[0u8; SECRET_LEN]), hash_secret(&other));
    }
}
