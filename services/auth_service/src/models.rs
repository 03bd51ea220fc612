use serde::{Deserialize, Serialize};
use shared_models::User;
use shared_security::PasswordRequirements;
use validator::Validate;

// Delegates to shared_security so the strength policy lives in one place.
fn validate_password(password: &str) -> Result<(), validator::ValidationError> {
    let requirements = PasswordRequirements {
        min_length: 8,
        max_length: 100,
        require_uppercase: true,
        require_lowercase: true,
        require_digit: true,
    };

    match shared_security::validate_password_strength_with_requirements(password, &requirements) {
        Ok(()) => Ok(()),
        Err(e) => Err(validator::ValidationError::new("invalid_password")
            .with_message(std::borrow::Cow::Owned(e.to_string()))),
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    pub username: String,

    #[validate(email(message = "Email address is invalid"))]
    #[validate(length(max = 100, message = "Email must not exceed 100 characters"))]
    pub email: String,

    #[validate(custom(function = "validate_password"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Body for login, register, and refresh responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
    pub email: String,
    pub role: String,
    /// Seconds until the issued token expires.
    #[serde(rename = "expiresIn")]
    pub expires_in: i64,
}

impl AuthResponse {
    pub fn new(token: String, user: &User, expires_in_secs: i64) -> Self {
        Self {
            token,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            expires_in: expires_in_secs,
        }
    }
}
