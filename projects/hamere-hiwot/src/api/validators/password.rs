use super::{ValidationError, Validator};

pub const MIN_PASSWORD_LEN: usize = 8;

/// New passwords need eight characters with an A-Z letter, a digit and a
/// character outside A-Z, a-z and 0-9.
pub struct PasswordPolicy;

impl PasswordPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Policy check plus the confirmation match.
    pub fn validate_pair(&self, password: &str, confirm: &str) -> Result<(), ValidationError> {
        self.validate(password)?;
        if password != confirm {
            return Err(ValidationError::new("W005", "confirm_password", "Passwords do not match"));
        }
        Ok(())
    }
}

impl Validator for PasswordPolicy {
    fn validate(&self, input: &str) -> Result<(), ValidationError> {
        if input.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::new(
                "W001",
                "new_password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
            ));
        }
        if !input.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::new("W002", "new_password", "Password must contain an uppercase letter"));
        }
        if !input.chars().any(|c| c.is_ascii_digit()) {
            return Err(ValidationError::new("W003", "new_password", "Password must contain a digit"));
        }
        if input.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::new("W004", "new_password", "Password must contain a special character"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy() {
        let p = PasswordPolicy::new();
        assert!(p.validate("Secur3!pass").is_ok());
        assert_eq!(p.validate("S3!a").unwrap_err().code, "W001");
        assert_eq!(p.validate("secur3!pass").unwrap_err().code, "W002");
        assert_eq!(p.validate("Secure!pass").unwrap_err().code, "W003");
        assert_eq!(p.validate("Secur3pass").unwrap_err().code, "W004");
    }

    #[test]
    fn test_policy_classes_are_ascii() {
        let p = PasswordPolicy::new();
        // Ethiopic letters count as special characters.
        assert!(p.validate("Passw0rdሀ").is_ok());
        // Non-ASCII capitals do not satisfy the uppercase rule.
        assert_eq!(p.validate("Ärger123!").unwrap_err().code, "W002");
    }

    #[test]
    fn test_pair_must_match() {
        let p = PasswordPolicy::new();
        assert!(p.validate_pair("Secur3!pass", "Secur3!pass").is_ok());
        assert_eq!(p.validate_pair("Secur3!pass", "Secur3!pasS").unwrap_err().code, "W005");
    }
}
