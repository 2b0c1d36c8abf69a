//! Admin password hashing: PBKDF2-HMAC-SHA256 with a per-account random
//! salt, stored as `base64(salt)$base64(hash)`.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

pub const PBKDF2_ITERATIONS: u32 = 100_000;
const HASH_LENGTH: usize = 32;
const SALT_LENGTH: usize = 16;

/// Hashes a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut hash = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut hash);

    format!("{}${}", BASE64.encode(salt), BASE64.encode(hash))
}

/// Verifies a password against a stored hash in constant time.
/// Malformed stored values simply fail verification.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_b64, hash_b64)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = BASE64.decode(salt_b64) else {
        return false;
    };
    let Ok(expected) = BASE64.decode(hash_b64) else {
        return false;
    };
    if expected.is_empty() {
        return false;
    }

    let mut hash = vec![0u8; expected.len()];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut hash);

    hash.ct_eq(&expected).into()
}
