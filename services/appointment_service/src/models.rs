use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_time_window"))]
pub struct AppointmentRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: String,

    #[validate(length(max = 200, message = "Location must not exceed 200 characters"))]
    pub location: Option<String>,

    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

fn validate_time_window(req: &AppointmentRequest) -> Result<(), ValidationError> {
    if req.ends_at > req.starts_at {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_time_window")
            .with_message(std::borrow::Cow::Borrowed("Appointment must end after it starts")))
    }
}
