use anyhow::Result;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

pub fn hash(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

pub fn verify(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_correct_password() {
        let h = hash("Secure-pass1").expect("Should hash password");
        assert!(verify("Secure-pass1", &h));
    }

    #[test]
    fn test_wrong_password_fails_verification() {
        let h = hash("correct-password").expect("Should hash");
        assert!(!verify("wrong-password", &h));
    }

    #[test]
    fn test_two_hashes_of_same_password_differ() {
        let h1 = hash("same-password").expect("Should hash");
        let h2 = hash("same-password").expect("Should hash");
        assert_ne!(h1, h2);
        assert!(verify("same-password", &h1));
        assert!(verify("same-password", &h2));
    }

    #[test]
    fn test_malformed_hash_returns_false() {
        assert!(!verify("any-password", "not-a-valid-hash-string"));
        assert!(!verify("any-password", ""));
    }

    #[test]
    fn test_hash_output_is_argon2_format() {
        let h = hash("test").expect("Should hash");
        assert!(h.starts_with("$argon2"), "Hash should be in PHC format, got: {}", h);
    }
}
