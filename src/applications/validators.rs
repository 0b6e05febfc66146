// src/applications/validators.rs

use super::models::JobApplicationRequest;
use crate::common::{require_text, ValidationResult, Validator};

pub struct ApplicationValidator;

impl Validator<JobApplicationRequest> for ApplicationValidator {
    fn validate(&self, data: &JobApplicationRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        require_text(&mut result, "company_name", &data.company_name, 200);
        require_text(&mut result, "position", &data.position, 200);
        require_text(&mut result, "status", &data.status, 50);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_every_missing_field() {
        let result = ApplicationValidator.validate(&JobApplicationRequest::default());

        assert!(!result.is_valid);
        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["company_name", "position", "status"]);
    }

    #[test]
    fn test_accepts_complete_request() {
        let request = JobApplicationRequest {
            company_name: "Acme".to_string(),
            position: "Engineer".to_string(),
            status: "Applied".to_string(),
            date_applied: None,
        };

        assert!(ApplicationValidator.validate(&request).is_valid);
    }

    #[test]
    fn test_rejects_overlong_status() {
        let request = JobApplicationRequest {
            company_name: "Acme".to_string(),
            position: "Engineer".to_string(),
            status: "x".repeat(51),
            date_applied: None,
        };

        let result = ApplicationValidator.validate(&request);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].field, "status");
    }
}
