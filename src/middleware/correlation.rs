use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{Error, HttpMessage, ResponseError};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::task::{Context, Poll};
use tracing::Instrument;
use uuid::Uuid;

pub const CORRELATION_HEADER: &str = "X-Correlation-ID";

const MAX_CORRELATION_LEN: usize = 64;

/// Request-scoped correlation identifier, stored in the request extensions.
#[derive(Debug, Clone)]
pub struct CorrelationId(pub String);

/// Accept a client-supplied id iff, after trimming, it is 1-64 characters
/// from `[A-Za-z0-9_-]`. Anything else is replaced with a fresh UUID.
pub fn sanitize_correlation_id(supplied: Option<&str>) -> String {
    if let Some(raw) = supplied {
        let trimmed = raw.trim();
        let valid = !trimmed.is_empty()
            && trimmed.len() <= MAX_CORRELATION_LEN
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if valid {
            return trimmed.to_string();
        }
    }
    Uuid::new_v4().to_string()
}

/// Assigns the per-request correlation id, carries it as a tracing-span field
/// for every inner log line, and echoes it on the response.
///
/// This filter is also the projection boundary for errors that escape the
/// inner chain as `Err`: they are rendered here so that every exit path
/// carries exactly one correlation header.
pub struct CorrelationFilter;

impl<S, B> Transform<S, ServiceRequest> for CorrelationFilter
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = CorrelationFilterService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CorrelationFilterService {
            service: Rc::new(service),
        }))
    }
}

pub struct CorrelationFilterService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for CorrelationFilterService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        let supplied = req
            .headers()
            .get(CORRELATION_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());
        let id = sanitize_correlation_id(supplied.as_deref());

        req.extensions_mut().insert(CorrelationId(id.clone()));

        // Cheap handle on the request so an escaped error can still be
        // rendered into a response below.
        let http_req = req.request().clone();
        let span = tracing::info_span!("request", correlation_id = %id);

        Box::pin(async move {
            let result = service.call(req).instrument(span).await;

            let mut res = match result {
                Ok(res) => res.map_into_boxed_body(),
                Err(err) => {
                    let response = err.as_response_error().error_response();
                    ServiceResponse::new(http_req, response)
                }
            };

            let header_name = HeaderName::from_static("x-correlation-id");
            // The id is drawn from [A-Za-z0-9_-] so this cannot fail.
            if let Ok(value) = HeaderValue::from_str(&id) {
                res.headers_mut().insert(header_name, value);
            }
            Ok(res)
        })
    }
}
