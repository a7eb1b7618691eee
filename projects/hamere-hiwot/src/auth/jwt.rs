use anyhow::Result;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,          // user id
    pub sid: String,       // session id, must still be registered
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

pub fn generate(user_id: i64, session_id: &str, role: &str, secret: &str, expiry_hours: u64) -> Result<String> {
    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id,
        sid: session_id.to_string(),
        role: role.to_string(),
        exp: now + (expiry_hours as usize * 3600),
        iat: now,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn verify(token: &str, secret: &str) -> Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-for-unit-tests-only";

    #[test]
    fn test_generate_and_verify_token() {
        let token = generate(7, "sess-1", "Teacher", TEST_SECRET, 24)
            .expect("Should generate token");
        assert!(!token.is_empty());

        let claims = verify(&token, TEST_SECRET).expect("Should verify valid token");
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.sid, "sess-1");
        assert_eq!(claims.role, "Teacher");
    }

    #[test]
    fn test_verify_wrong_secret_fails() {
        let token = generate(1, "s", "Admin", TEST_SECRET, 24).expect("Should generate token");
        assert!(verify(&token, "wrong-secret").is_err());
    }

    #[test]
    fn test_verify_malformed_token_fails() {
        assert!(verify("not.a.valid.jwt", TEST_SECRET).is_err());
        assert!(verify("", TEST_SECRET).is_err());
    }

    #[test]
    fn test_token_expiry_set_correctly() {
        let before = Utc::now().timestamp() as usize;
        let token = generate(1, "s", "Admin", TEST_SECRET, 2).expect("Should generate token");
        let after = Utc::now().timestamp() as usize;

        let claims = verify(&token, TEST_SECRET).expect("Should verify");
        assert!(claims.exp >= before + 2 * 3600);
        assert!(claims.exp <= after + 2 * 3600);
    }
}
