// src/auth/validators.rs

use super::models::CredentialsRequest;
use crate::common::{require_text, ValidationResult, Validator};

/// Shape check for login and registration bodies
///
/// Policy rules (characters, password strength, duplicates) belong to the
/// credential store and are only applied on registration.
pub struct CredentialsValidator;

impl Validator<CredentialsRequest> for CredentialsValidator {
    fn validate(&self, data: &CredentialsRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        require_text(&mut result, "username", &data.username, 256);

        if data.password.is_empty() {
            result.add_error("password", "The password field is required.");
        } else if data.password.len() > 1024 {
            result.add_error("password", "The password field is too long.");
        }

        result
    }
}
