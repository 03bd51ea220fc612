use actix_web::http::header;
use actix_web::HttpResponse;
use thiserror::Error;

/// Application-wide error taxonomy.
///
/// Every failure that can reach a client is one of these kinds. The wire
/// projection is a single JSON shape `{ "message": <string> }`; the 429 kind
/// additionally carries `retryAfter` and a `Retry-After` header.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    /// Malformed request body, path, or query. The message is always the
    /// generic string below; parser internals must never reach the client.
    #[error("Bad request")]
    Parse,

    #[error("Invalid credentials")]
    Authentication,

    #[error("{0}")]
    Authorization(String),

    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("{0}")]
    Conflict(String),

    #[error("Rate limit exceeded")]
    RateLimited { retry_after_secs: u64 },

    #[error("Internal server error")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AppError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Stable kind label used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::Parse => "parse",
            AppError::Authentication => "authentication",
            AppError::Authorization(_) => "authorization",
            AppError::NotFound { .. } => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::RateLimited { .. } => "rate_limited",
            AppError::Internal(_) => "internal",
            AppError::Configuration(_) => "configuration",
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = Vec::new();
        for (field, errors) in e.field_errors() {
            for err in errors {
                match &err.message {
                    Some(msg) => messages.push(msg.to_string()),
                    None => messages.push(format!("Invalid value for field '{}'", field)),
                }
            }
        }
        messages.sort();
        AppError::Validation(messages.join(", "))
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            AppError::Validation(_) | AppError::Parse => StatusCode::BAD_REQUEST,
            AppError::Authentication => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) | AppError::Configuration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Only the internal kind logs its detail here; the other kinds carry
        // user-safe messages and are logged at the projection site.
        if let AppError::Internal(detail) = self {
            tracing::error!(kind = self.kind(), detail = %detail, "internal error projected");
        }

        let mut builder = HttpResponse::build(self.status_code());
        builder.insert_header((header::CONTENT_TYPE, "application/json; charset=UTF-8"));

        match self {
            AppError::RateLimited { retry_after_secs } => {
                let retry_after = (*retry_after_secs).max(1);
                builder
                    .insert_header((header::RETRY_AFTER, retry_after.to_string()))
                    .json(serde_json::json!({
                        "message": self.to_string(),
                        "retryAfter": retry_after,
                    }))
            }
            _ => builder.json(serde_json::json!({ "message": self.to_string() })),
        }
    }
}
