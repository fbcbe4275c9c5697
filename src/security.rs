//! Password hashing for the credential store.
//!
//! Hashes are Argon2id PHC strings with a fresh 16-byte random salt. Only the
//! PHC string is ever stored; plaintext passwords never leave the request that
//! carried them.

use anyhow::{Result, anyhow};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use once_cell::sync::Lazy;
use password_hash::{SaltString, PasswordHash};

pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2.hash_password(password.as_bytes(), &salt).map_err(|e| anyhow!(e.to_string()))?.to_string();
    Ok(phc)
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else { false }
}

// Verified against when the email is unknown so both login failures do the same work.
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| hash_password("redress-dummy-password").ok());

/// Burn one verification without a real account. Always returns false.
pub fn verify_dummy(password: &str) -> bool {
    if let Some(h) = DUMMY_HASH.as_deref() {
        let _ = verify_password(h, password);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let h = hash_password("p1").unwrap();
        assert!(h.starts_with("$argon2"));
        assert!(verify_password(&h, "p1"));
        assert!(!verify_password(&h, "p2"));
    }

    #[test]
    fn salts_differ() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("not-a-phc-string", "anything"));
        assert!(!verify_dummy("redress-dummy-password"));
    }
}
