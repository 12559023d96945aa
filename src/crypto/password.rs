use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::CryptoError;

#[cfg(not(test))]
pub const PBKDF2_ITERATIONS: u32 = 600_000;
#[cfg(test)]
pub const PBKDF2_ITERATIONS: u32 = 1_000;

pub const HASH_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 16;

const SCHEME: &str = "pbkdf2-sha256";

/// Hash a user password as `pbkdf2-sha256$<iterations>$<salt>$<hash>`
/// (base64 fields). The iteration count travels with the hash so it can
/// be raised without invalidating stored passwords.
pub fn hash_password(password: &str) -> Result<String, CryptoError> {
    if password.is_empty() {
        return Err(CryptoError::EmptyPassword);
    }
    let salt = generate_salt();
    let hash = derive(password, &salt, PBKDF2_ITERATIONS);
    Ok(format!(
        "{SCHEME}${PBKDF2_ITERATIONS}${}${}",
        STANDARD.encode(salt),
        STANDARD.encode(hash)
    ))
}

/// Check a password against a stored hash in constant time.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, CryptoError> {
    let mut parts = stored.split('$');
    let (Some(SCHEME), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(CryptoError::MalformedHash);
    };

    let iterations: u32 = iterations.parse().map_err(|_| CryptoError::MalformedHash)?;
    let salt = STANDARD.decode(salt).map_err(|_| CryptoError::MalformedHash)?;
    let expected = STANDARD
        .decode(expected)
        .map_err(|_| CryptoError::MalformedHash)?;
    if iterations == 0 || expected.len() != HASH_LENGTH {
        return Err(CryptoError::MalformedHash);
    }

    let actual = derive(password, &salt, iterations);
    Ok(actual.as_slice().ct_eq(expected.as_slice()).into())
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LENGTH] {
    let mut out = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

/// Generate a cryptographically random salt
fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let stored = hash_password("s3nha-forte").unwrap();
        assert!(stored.starts_with("pbkdf2-sha256$1000$"));
        assert!(verify_password("s3nha-forte", &stored).unwrap());
        assert!(!verify_password("outra", &stored).unwrap());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("senha").unwrap();
        let b = hash_password("senha").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn empty_password_rejected() {
        assert!(matches!(hash_password(""), Err(CryptoError::EmptyPassword)));
    }

    #[test]
    fn malformed_hashes_rejected() {
        for stored in [
            "",
            "plain-text",
            "bcrypt$10$abc$def",
            "pbkdf2-sha256$x$AAAA$AAAA",
            "pbkdf2-sha256$1000$AAAA$AAAA",
            "pbkdf2-sha256$1000$AAAA$AAAA$extra",
        ] {
            assert!(
                matches!(verify_password("senha", stored), Err(CryptoError::MalformedHash)),
                "{stored}"
            );
        }
    }
}
