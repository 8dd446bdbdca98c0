//! Password hashing using Argon2id.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{Error as ArgonError, SaltString};
use argon2::{Argon2, PasswordHasher as _};

use crate::utility::tracing_targets::TRACING_TARGET_PASSWORD_HASHER;

/// Error raised when a password cannot be hashed.
pub type HashError = ArgonError;

/// Password hashing service using Argon2id with default parameters.
///
/// Hashes are PHC strings that embed the algorithm, parameters and salt, so
/// they can be stored as-is without extra state.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Creates a new instance of the [`PasswordHasher`] service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hashes a password with a freshly generated random salt.
    ///
    /// The plaintext is never logged.
    pub fn hash_password(&self, password: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!(
                    target: TRACING_TARGET_PASSWORD_HASHER,
                    error = %e,
                    "password hashing operation failed"
                );
                e
            })?;

        Ok(password_hash.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_phc_argon2id_and_salted() -> anyhow::Result<()> {
        let hasher = PasswordHasher::new();
        let first = hasher.hash_password("secret1")?;
        let second = hasher.hash_password("secret1")?;

        assert!(first.starts_with("$argon2id$"));
        assert!(!first.contains("secret1"));
        assert_ne!(first, second);
        Ok(())
    }
}
