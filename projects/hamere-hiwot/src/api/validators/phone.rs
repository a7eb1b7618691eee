use regex::Regex;
use std::sync::LazyLock;

use super::{ValidationError, Validator};

static ETHIOPIAN_MOBILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+2519\d{8}$").expect("Invalid regex")
});

/// Guardian contact numbers: `+2519` followed by eight digits.
pub struct PhoneValidator {
    field: &'static str,
}

impl PhoneValidator {
    pub fn new(field: &'static str) -> Self {
        Self { field }
    }
}

impl Validator for PhoneValidator {
    fn validate(&self, input: &str) -> Result<(), ValidationError> {
        let s = input.trim();

        if s.is_empty() {
            return Err(ValidationError::new("P001", self.field, "Phone number cannot be empty"));
        }

        if !ETHIOPIAN_MOBILE.is_match(s) {
            return Err(
                ValidationError::new("P002", self.field, format!("Invalid phone number: {}", s))
                    .with_suggestion("Use the +2519XXXXXXXX format"),
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_numbers() {
        let v = PhoneValidator::new("parent_phone");
        assert!(v.validate("+251911234567").is_ok());
        assert!(v.validate(" +251912345678 ").is_ok());
    }

    #[test]
    fn test_invalid_numbers() {
        let v = PhoneValidator::new("parent_phone");
        assert_eq!(v.validate("").unwrap_err().code, "P001");
        assert_eq!(v.validate("0911234567").unwrap_err().code, "P002");
        assert_eq!(v.validate("+251811234567").unwrap_err().code, "P002");
        assert_eq!(v.validate("+25191123456").unwrap_err().code, "P002");
        assert_eq!(v.validate("+2519112345678").unwrap_err().code, "P002");
    }

    #[test]
    fn test_error_names_field() {
        let err = PhoneValidator::new("guardian_phone2").validate("abc").unwrap_err();
        assert_eq!(err.field, "guardian_phone2");
        assert!(err.suggestion.is_some());
    }
}
