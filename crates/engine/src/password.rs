//! Salted password hashing.
//!
//! Each account keeps its own random salt next to the Argon2id hash. Checking
//! a password recomputes the hash with the stored salt and compares the raw
//! outputs in constant time.

use argon2::{
    Argon2, PasswordHash, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};

use crate::{EngineError, ResultEngine};

/// A freshly hashed password ready to be persisted.
#[derive(Debug)]
pub(crate) struct HashedPassword {
    pub salt: String,
    pub hash: String,
}

pub(crate) fn hash_password(password: &str) -> ResultEngine<HashedPassword> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| EngineError::PasswordHash(err.to_string()))?
        .to_string();
    Ok(HashedPassword {
        salt: salt.as_str().to_string(),
        hash,
    })
}

pub(crate) fn password_matches(password: &str, salt: &str, stored: &str) -> ResultEngine<bool> {
    let salt =
        SaltString::from_b64(salt).map_err(|err| EngineError::PasswordHash(err.to_string()))?;
    let stored =
        PasswordHash::new(stored).map_err(|err| EngineError::PasswordHash(err.to_string()))?;
    let candidate = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| EngineError::PasswordHash(err.to_string()))?;

    Ok(match (candidate.hash, stored.hash) {
        (Some(candidate), Some(stored)) => candidate == stored,
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_never_contains_plaintext() {
        let hashed = hash_password("foobar").unwrap();
        assert!(!hashed.hash.contains("foobar"));
        assert!(hashed.hash.starts_with("$argon2"));
        assert!(hashed.hash.contains(&hashed.salt));
    }

    #[test]
    fn matches_only_the_original_password() {
        let hashed = hash_password("foobar").unwrap();
        assert!(password_matches("foobar", &hashed.salt, &hashed.hash).unwrap());
        assert!(!password_matches("barfoo", &hashed.salt, &hashed.hash).unwrap());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("foobar").unwrap();
        let b = hash_password("foobar").unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn wrong_salt_does_not_match() {
        let a = hash_password("foobar").unwrap();
        let b = hash_password("foobar").unwrap();
        assert!(!password_matches("foobar", &b.salt, &a.hash).unwrap());
    }

    #[test]
    fn corrupt_hash_is_an_error() {
        let a = hash_password("foobar").unwrap();
        assert!(matches!(
            password_matches("foobar", &a.salt, "not-a-hash"),
            Err(EngineError::PasswordHash(_))
        ));
    }
}
