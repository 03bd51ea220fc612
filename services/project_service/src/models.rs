use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

const STATUSES: [&str; 4] = ["planned", "active", "on_hold", "done"];

fn validate_status(status: &str) -> Result<(), ValidationError> {
    if STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_status").with_message(std::borrow::Cow::Borrowed(
            "Status must be one of: planned, active, on_hold, done",
        )))
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ProjectRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Description must not exceed 1000 characters"))]
    pub description: Option<String>,

    #[validate(custom(function = "validate_status"))]
    #[serde(default = "default_status")]
    pub status: String,

    pub due_date: Option<NaiveDate>,
}

fn default_status() -> String {
    "planned".to_string()
}
