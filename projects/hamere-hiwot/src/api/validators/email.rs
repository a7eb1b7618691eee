use regex::Regex;
use std::sync::LazyLock;

use super::{ValidationError, Validator};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex")
});

pub struct EmailValidator;

impl EmailValidator {
    pub fn new() -> Self {
        Self
    }
}

impl Validator for EmailValidator {
    fn validate(&self, input: &str) -> Result<(), ValidationError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ValidationError::new("M001", "email", "Email cannot be empty"));
        }
        if !EMAIL.is_match(s) {
            return Err(
                ValidationError::new("M002", "email", format!("Invalid email address: {}", s))
                    .with_suggestion("Use name@example.com format"),
            );
        }
        Ok(())
    }
}
