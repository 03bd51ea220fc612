use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlerResponse, ErrorHandlers};
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use shared_errors::AppError;

/// The single wire shape every failure is projected into.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Extractor configuration that converts JSON body failures into the parse
/// kind instead of leaking deserializer internals.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        tracing::debug!("request body rejected: {}", err);
        AppError::Parse.into()
    })
}

/// Path-parameter failures (including malformed percent-encoding that breaks
/// typed segments) become the same generic 400.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        tracing::debug!("path rejected: {}", err);
        AppError::Parse.into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        tracing::debug!("query string rejected: {}", err);
        AppError::Parse.into()
    })
}

/// Response-level hook that rewrites any error response which is not already
/// JSON (router 404s, method mismatches, failures raised below the
/// application layer) into the uniform shape.
pub fn json_error_hook<B: MessageBody + 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new().default_handler(render_json_error)
}

fn render_json_error<B: MessageBody + 'static>(
    res: ServiceResponse<B>,
) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let already_json = res
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false);

    if already_json {
        return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
    }

    let status = res.status();
    tracing::debug!(status = %status, "rewriting non-JSON error response");

    let (req, _) = res.into_parts();
    let projected = HttpResponse::build(status)
        .insert_header((CONTENT_TYPE, "application/json; charset=UTF-8"))
        .json(ErrorResponse {
            message: default_message(status).to_string(),
        });

    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, projected).map_into_right_body(),
    ))
}

fn default_message(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "Bad request",
        StatusCode::UNAUTHORIZED => "Invalid credentials",
        StatusCode::FORBIDDEN => "Forbidden",
        StatusCode::NOT_FOUND => "Not found",
        StatusCode::METHOD_NOT_ALLOWED => "Method not allowed",
        StatusCode::PAYLOAD_TOO_LARGE => "Payload too large",
        StatusCode::TOO_MANY_REQUESTS => "Rate limit exceeded",
        _ => "Internal server error",
    }
}
