//! Credential and token helpers shared by the Ingestion/Sync API-key path
//! and the Auth Broker (C7). Password hashing follows the teacher's
//! `auth::hash_password`/`verify_password` (`bcrypt`, cost 12) exactly;
//! opaque bearer tokens (API keys, session ids, reset codes) are hashed
//! with SHA-256 instead, since those are checked on every request and a
//! deliberately slow KDF there would make the hot path pay bcrypt's cost
//! for a token that is already high-entropy and random (see DESIGN.md).

use rand::RngCore;
use rand::distributions::{Alphanumeric, DistString};

use crate::errors::AppError;
use crate::hashing::sha256_hex;

const BCRYPT_COST: u32 = 12;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    Ok(bcrypt::hash(password, BCRYPT_COST)?)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    Ok(bcrypt::verify(password, hash)?)
}

/// Generates a new opaque API key. Returns `(plaintext, hash)` — the
/// plaintext is shown to the caller exactly once; only the hash is
/// persisted (§4.7, §7).
pub fn generate_api_key() -> (String, String) {
    let plaintext = format!("ps_{}", Alphanumeric.sample_string(&mut rand::thread_rng(), 40));
    let hash = sha256_hex(plaintext.as_bytes());
    (plaintext, hash)
}

pub fn hash_token(plaintext: &str) -> String {
    sha256_hex(plaintext.as_bytes())
}

/// Hashes a password-reset code with the same bcrypt scheme as account
/// passwords, so comparison is constant-time and doesn't leak timing
/// information about how many leading digits matched (§3, §8).
pub fn hash_reset_code(code: &str) -> Result<String, AppError> {
    Ok(bcrypt::hash(code, BCRYPT_COST)?)
}

pub fn verify_reset_code(code: &str, hash: &str) -> Result<bool, AppError> {
    Ok(bcrypt::verify(code, hash)?)
}

/// Opaque session token (cookie value): 256 bits of randomness, hex
/// encoded to 64 lowercase characters (§8).
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Six-digit numeric code for email/SMS verification flows (§4.7).
pub fn generate_numeric_code() -> String {
    let mut bytes = [0u8; 4];
    rand::thread_rng().fill_bytes(&mut bytes);
    let n = u32::from_be_bytes(bytes) % 1_000_000;
    format!("{n:06}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_roundtrips_and_rejects_wrong_password() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn api_keys_are_unique_and_hash_is_deterministic() {
        let (plain_a, hash_a) = generate_api_key();
        let (plain_b, _) = generate_api_key();
        assert_ne!(plain_a, plain_b);
        assert_eq!(hash_token(&plain_a), hash_a);
    }

    #[test]
    fn numeric_code_is_always_six_digits() {
        for _ in 0..20 {
            let code = generate_numeric_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn session_token_is_64_lowercase_hex_chars() {
        let token = generate_session_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(token, generate_session_token());
    }

    #[test]
    fn reset_code_hash_roundtrips_and_rejects_wrong_code() {
        let hash = hash_reset_code("123456").unwrap();
        assert!(verify_reset_code("123456", &hash).unwrap());
        assert!(!verify_reset_code("654321", &hash).unwrap());
    }
}
