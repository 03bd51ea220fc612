use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: String,

    #[validate(length(max = 1000, message = "Description must not exceed 1000 characters"))]
    pub description: Option<String>,

    pub due_date: Option<NaiveDate>,

    /// 0 = low, 1 = normal, 2 = high.
    #[validate(range(min = 0, max = 2, message = "Priority must be between 0 and 2"))]
    #[serde(default = "default_priority")]
    pub priority: i16,
}

fn default_priority() -> i16 {
    1
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: String,

    #[validate(length(max = 1000, message = "Description must not exceed 1000 characters"))]
    pub description: Option<String>,

    pub due_date: Option<NaiveDate>,

    #[validate(range(min = 0, max = 2, message = "Priority must be between 0 and 2"))]
    pub priority: i16,

    pub done: bool,
}
