use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateContactRequest {
    #[validate(length(min = 1, max = 50, message = "First name must be 1-50 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 50, message = "Last name must be 1-50 characters"))]
    pub last_name: String,

    #[validate(email(message = "Contact email is invalid"))]
    pub email: Option<String>,

    #[validate(length(max = 30, message = "Phone must not exceed 30 characters"))]
    pub phone: Option<String>,

    #[validate(length(max = 200, message = "Address must not exceed 200 characters"))]
    pub address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateContactRequest {
    #[validate(length(min = 1, max = 50, message = "First name must be 1-50 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 50, message = "Last name must be 1-50 characters"))]
    pub last_name: String,

    #[validate(email(message = "Contact email is invalid"))]
    pub email: Option<String>,

    #[validate(length(max = 30, message = "Phone must not exceed 30 characters"))]
    pub phone: Option<String>,

    #[validate(length(max = 200, message = "Address must not exceed 200 characters"))]
    pub address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_contact_valid() {
        let request = CreateContactRequest {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: Some("ada@example.com".to_string()),
            phone: Some("555-0100".to_string()),
            address: None,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_contact_requires_names() {
        let request = CreateContactRequest {
            first_name: "".to_string(),
            last_name: "Lovelace".to_string(),
            email: None,
            phone: None,
            address: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_contact_rejects_bad_email() {
        let request = CreateContactRequest {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: Some("not-an-email".to_string()),
            phone: None,
            address: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_contact_name_boundary() {
        let request = CreateContactRequest {
            first_name: "a".repeat(50),
            last_name: "b".repeat(51),
            email: None,
            phone: None,
            address: None,
        };
        assert!(request.validate().is_err());

        let request = CreateContactRequest {
            first_name: "a".repeat(50),
            last_name: "b".repeat(50),
            email: None,
            phone: None,
            address: None,
        };
        assert!(request.validate().is_ok());
    }
}
