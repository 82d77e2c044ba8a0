//! Opaque token generation on `ring` primitives.

use ring::digest;
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::OAuthError;

/// Produce an opaque 40-character lowercase hex identifier: the SHA-1
/// digest of 256 bytes drawn from the system CSPRNG.
///
/// The digest is an identifier, not a secret derivation; the [`Model`]
/// may substitute its own generators and this is only the fallback.
///
/// [`Model`]: crate::model::Model
pub fn generate_random_token() -> Result<String, OAuthError> {
    let rng = SystemRandom::new();
    let mut seed = [0u8; 256];
    rng.fill(&mut seed)
        .map_err(|_| OAuthError::server_error("system random generator unavailable"))?;
    let digest = digest::digest(&digest::SHA1_FOR_LEGACY_USE_ONLY, &seed);
    Ok(hex_encode(digest.as_ref()))
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tokens_are_40_hex_chars() {
        let token = generate_random_token().unwrap();
        assert_eq!(token.len(), 40);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn tokens_do_not_repeat() {
        let a = generate_random_token().unwrap();
        let b = generate_random_token().unwrap();
        assert_ne!(a, b);
    }
}
