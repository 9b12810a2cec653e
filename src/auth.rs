//! Remember-token primitives.
//!
//! A remember token is the client-held credential for a persistent session.
//! Only its digest is ever persisted; the raw token exists server-side for
//! the duration of the sign-in request that mints it.

use base64::Engine;
use sha2::{Digest, Sha256};

/// Random bytes per token (256 bits of entropy).
const TOKEN_BYTES: usize = 32;

/// Generate a new remember token: OS randomness, base64url without padding.
#[must_use]
pub fn new_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; TOKEN_BYTES] = rng.random();

    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// One-way digest of a token (SHA-256, lower-case hex).
///
/// Deterministic: the same token always yields the same digest, which is the
/// only form stored and compared server-side.
#[must_use]
pub fn token_digest(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());

    digest.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable() {
        let token = new_token();
        assert_eq!(token_digest(&token), token_digest(&token));
    }

    #[test]
    fn distinct_tokens_have_distinct_digests() {
        let a = new_token();
        let b = new_token();
        assert_ne!(a, b);
        assert_ne!(token_digest(&a), token_digest(&b));
    }

    #[test]
    fn token_is_url_safe() {
        let token = new_token();
        // 32 bytes -> 43 base64url chars, no padding
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn digest_is_hex_sha256() {
        let digest = token_digest("abc");
        assert_eq!(digest.len(), 64);
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
