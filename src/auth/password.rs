use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

/// Argon2id v1.3 with the crate's default cost parameters.
fn hasher() -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default())
}

/// Salted hash of a registration password, as a PHC string.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    hasher()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "password hashing failed");
            anyhow::anyhow!("hash password: {}", e)
        })
}

/// `Ok(false)` on a mismatch. Errors only when the stored hash is unreadable.
pub fn verify_password(plain: &str, stored_hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| {
        error!(error = %e, "stored password hash is not a PHC string");
        anyhow::anyhow!("parse stored hash: {}", e)
    })?;
    match hasher().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => {
            error!(error = %e, "password verification failed");
            Err(anyhow::anyhow!("verify password: {}", e))
        }
    }
}

/// [`hash_password`] on the blocking pool; the work factor is deliberately slow.
pub async fn hash_password_blocking(plain: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain)).await?
}

pub async fn verify_password_blocking(plain: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &hash)).await?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_length_password_verifies() {
        let hash = hash_password("secret").expect("hash");
        assert!(hash.starts_with("$argon2id$v=19$"));
        assert!(verify_password("secret", &hash).expect("verify"));
    }

    #[test]
    fn near_miss_passwords_do_not_verify() {
        let hash = hash_password("secret1").expect("hash");
        for attempt in ["secret2", "Secret1", "secret1 ", "secret"] {
            assert!(!verify_password(attempt, &hash).expect("verify"), "{attempt}");
        }
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("secret1").unwrap();
        let b = hash_password("secret1").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("secret1", &a).unwrap());
        assert!(verify_password("secret1", &b).unwrap());
    }

    #[test]
    fn unreadable_stored_hash_is_an_error() {
        let err = verify_password("secret1", "plaintext-secret1").unwrap_err();
        assert!(err.to_string().starts_with("parse stored hash"));
    }

    #[tokio::test]
    async fn blocking_variants_agree() {
        let hash = hash_password_blocking("secret1".into()).await.unwrap();
        assert!(verify_password_blocking("secret1".into(), hash.clone()).await.unwrap());
        assert!(!verify_password_blocking("wrong!!".into(), hash).await.unwrap());
    }
}
