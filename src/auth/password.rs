/// Password Hashing and Verification
///
/// Passwords are stored only as salted bcrypt credentials. Verification is
/// the only way to test a guess.

use bcrypt::{hash, verify};

use crate::error::AuthError;

/// Hash a password using bcrypt
///
/// # Arguments
/// * `password` - Plain text password to hash
/// * `cost` - bcrypt work factor (4..=31)
///
/// # Errors
/// Returns `Internal` only if bcrypt itself fails (bad cost, RNG failure)
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    hash(password, cost)
        .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its stored credential
///
/// A mismatch and an unparseable credential both surface as
/// `InvalidCredentials` so callers cannot tell them apart.
pub fn verify_password(hashed_password: &str, password: &str) -> Result<(), AuthError> {
    match verify(password, hashed_password) {
        Ok(true) => Ok(()),
        Ok(false) => Err(AuthError::InvalidCredentials),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password credential could not be parsed");
            Err(AuthError::InvalidCredentials)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[test]
    fn test_hash_password() {
        let password = "hunter2";
        let hash = hash_password(password, TEST_COST).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
    }

    #[test]
    fn test_hash_is_salted() {
        let first = hash_password("hunter2", TEST_COST).unwrap();
        let second = hash_password("hunter2", TEST_COST).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("hunter2", TEST_COST).expect("Failed to hash password");
        assert!(verify_password(&hash, "hunter2").is_ok());
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("hunter2", TEST_COST).expect("Failed to hash password");
        assert_eq!(
            verify_password(&hash, "hunter3"),
            Err(AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn test_verify_malformed_credential() {
        assert_eq!(
            verify_password("not-a-bcrypt-hash", "hunter2"),
            Err(AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn test_many_passwords_round_trip() {
        let passwords = ["a", "correct horse battery staple", "пароль", "p@ss w0rd!"];
        for (i, password) in passwords.iter().enumerate() {
            let hash = hash_password(password, TEST_COST).unwrap();
            assert!(verify_password(&hash, password).is_ok());

            let other = passwords[(i + 1) % passwords.len()];
            assert!(verify_password(&hash, other).is_err());
        }
    }

    #[test]
    fn test_invalid_cost() {
        assert!(matches!(hash_password("hunter2", 2), Err(AuthError::Internal(_))));
    }
}
