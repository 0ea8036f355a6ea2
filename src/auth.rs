//! Credential handling: salted PBKDF2-SHA256 password hashes and hashed
//! password-reset tokens. Nothing secret is ever stored in the clear.

use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

pub const PBKDF2_ITERATIONS: u32 = 600_000;
const HASH_LENGTH: usize = 32;
const SALT_LENGTH: usize = 16;
const SCHEME: &str = "pbkdf2-sha256";

fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD_NO_PAD
}

/// Hash a password into a self-describing string:
/// `pbkdf2-sha256$<iterations>$<salt b64>$<hash b64>`.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    encode_hash(password, &salt, PBKDF2_ITERATIONS)
}

/// Verify a password against a stored hash string. Malformed stored values
/// verify as false rather than erroring, so a corrupted row cannot grant
/// access.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(iters), Some(salt_b64), Some(hash_b64)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if scheme != SCHEME || parts.next().is_some() {
        return false;
    }
    let Ok(iterations) = iters.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (b64().decode(salt_b64), b64().decode(hash_b64)) else {
        return false;
    };

    let mut derived = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut derived);
    derived.ct_eq(&expected).into()
}

/// Generate a random password-reset token (URL-safe base64, 32 bytes).
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hash of a token, hex-encoded. Only this form is persisted.
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn encode_hash(password: &str, salt: &[u8], iterations: u32) -> String {
    let mut hash = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut hash);
    format!(
        "{SCHEME}${iterations}${}${}",
        b64().encode(salt),
        b64().encode(hash)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // Full-strength PBKDF2 is deliberately slow; tests use fewer rounds.
    fn quick_hash(password: &str) -> String {
        let mut salt = [0u8; SALT_LENGTH];
        rand::thread_rng().fill_bytes(&mut salt);
        encode_hash(password, &salt, 1000)
    }

    #[test]
    fn correct_password_verifies() {
        let stored = quick_hash("s3cret-pass");
        assert!(verify_password("s3cret-pass", &stored));
    }

    #[test]
    fn wrong_password_rejected() {
        let stored = quick_hash("s3cret-pass");
        assert!(!verify_password("wrong", &stored));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        assert_ne!(quick_hash("pass"), quick_hash("pass"));
    }

    #[test]
    fn hash_string_is_self_describing() {
        let stored = quick_hash("pass");
        assert!(stored.starts_with("pbkdf2-sha256$1000$"));
        assert_eq!(stored.split('$').count(), 4);
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        for stored in ["", "plaintext", "pbkdf2-sha256$abc$x$y", "md5$1$a$b"] {
            assert!(!verify_password("pass", stored), "accepted {stored:?}");
        }
    }

    #[test]
    fn reset_tokens_are_unique_and_urlsafe() {
        let t1 = generate_reset_token();
        let t2 = generate_reset_token();
        assert_ne!(t1, t2);
        assert!(!t1.contains('+') && !t1.contains('/'));
    }

    #[test]
    fn token_hash_is_deterministic_hex() {
        let h = hash_token("some-token");
        assert_eq!(h, hash_token("some-token"));
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(h, hash_token("other-token"));
    }

    #[test]
    fn full_strength_hash_round_trips() {
        let stored = hash_password("clinic-password");
        assert!(stored.contains("$600000$"));
        assert!(verify_password("clinic-password", &stored));
    }
}
