//! Password hashing and verification.
//!
//! Argon2 work is CPU heavy and runs on the blocking pool so request workers
//! stay free.

use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tokio::task;

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(hash)
}

pub fn verify_password(hash: &str, password: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Hash on the blocking pool.
pub async fn hash(password: String) -> Result<String> {
    task::spawn_blocking(move || hash_password(&password))
        .await
        .context("password hashing task failed")?
}

/// Verify on the blocking pool.
pub async fn verify(hash: String, password: String) -> Result<bool> {
    task::spawn_blocking(move || verify_password(&hash, &password))
        .await
        .context("password verification task failed")?
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn hash_and_verify_round_trip() -> Result<()> {
        let hash = hash_password("correct horse battery staple")?;
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "correct horse battery staple")?);
        assert!(!verify_password(&hash, "wrong password")?);
        Ok(())
    }

    #[test]
    fn hashes_are_salted() -> Result<()> {
        let first = hash_password("sekreto")?;
        let second = hash_password("sekreto")?;
        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(verify_password("not-a-phc-string", "password").is_err());
    }

    #[tokio::test]
    async fn blocking_wrappers_round_trip() -> Result<()> {
        let hashed = hash("sekreto".to_string()).await?;
        assert!(verify(hashed.clone(), "sekreto".to_string()).await?);
        assert!(!verify(hashed, "wrong".to_string()).await?);
        Ok(())
    }
}
