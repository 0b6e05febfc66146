// Common validation types and traits

use serde::Serialize;

/// A single rejected field, reported back to the client as-is
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.is_valid = false;
        self.errors.push(ValidationError::new(field, message));
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.is_valid {
            self.is_valid = false;
            self.errors.extend(other.errors);
        }
    }

    /// Converts into `Err` carrying every collected error, or `Ok(())`
    pub fn into_result(self) -> Result<(), Vec<ValidationError>> {
        if self.is_valid {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

pub trait Validator<T> {
    fn validate(&self, data: &T) -> ValidationResult;
}

/// Adds a "required" error when the value is blank, and a length error when it
/// exceeds `max_len` characters.
pub fn require_text(result: &mut ValidationResult, field: &str, value: &str, max_len: usize) {
    if value.trim().is_empty() {
        result.add_error(field, &format!("The {} field is required.", field));
    } else if value.chars().count() > max_len {
        result.add_error(
            field,
            &format!("The {} field must be at most {} characters.", field, max_len),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_all_errors() {
        let mut first = ValidationResult::new();
        first.add_error("username", "taken");

        let mut second = ValidationResult::new();
        second.add_error("password", "too short");
        second.add_error("password", "needs a digit");

        first.merge(second);
        assert!(!first.is_valid);
        assert_eq!(first.errors.len(), 3);
    }

    #[test]
    fn test_require_text() {
        let mut result = ValidationResult::new();
        require_text(&mut result, "position", "   ", 10);
        require_text(&mut result, "status", "way too long value", 10);
        require_text(&mut result, "company_name", "Acme", 10);

        let errors = result.into_result().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "position");
        assert_eq!(errors[1].field, "status");
    }
}
