//! Request-line logging with PII-safe fields.
//!
//! Every request produces exactly one access log line carrying the
//! correlation id, a masked client address, a sanitized request line, and the
//! response status. Masking rules live in [`masking`].

pub mod masking;

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header;
use actix_web::{Error, HttpMessage};
use futures_util::future::LocalBoxFuture;
use std::fmt::Write as _;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::Instant;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

use crate::middleware::correlation::CorrelationId;
use masking::{mask_client_ip, mask_pii, redact_query, sanitize_log_value, truncate_user_agent};

/// Event formatter that masks PII in every rendered log line, whatever code
/// emitted it. Wraps the normal formatter and rewrites its output just
/// before it reaches the sink.
pub struct MaskingFormat<F> {
    inner: F,
}

impl<F> MaskingFormat<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

impl<S, N, F> FormatEvent<S, N> for MaskingFormat<F>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'writer> FormatFields<'writer> + 'static,
    F: FormatEvent<S, N>,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let mut buf = String::new();
        self.inner.format_event(ctx, Writer::new(&mut buf), event)?;
        writer.write_str(&mask_pii(&buf))
    }
}

/// Emits one sanitized access log line per request.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerService {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestLoggerService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        let started = Instant::now();
        let method = req.method().to_string();
        let path = sanitize_log_value(req.path());
        let query = redact_query(&sanitize_log_value(req.query_string()));
        let remote = mask_client_ip(
            &req.peer_addr()
                .map(|addr| addr.ip().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        );
        let user_agent = req
            .headers()
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .map(|ua| truncate_user_agent(&sanitize_log_value(ua)))
            .unwrap_or_else(|| masking::EMPTY_PLACEHOLDER.to_string());

        Box::pin(async move {
            let res = service.call(req).await?;

            let correlation_id = res
                .request()
                .extensions()
                .get::<CorrelationId>()
                .map(|c| c.0.clone())
                .unwrap_or_default();

            let status = res.status();
            let latency_ms = started.elapsed().as_millis() as u64;
            if status.is_server_error() {
                tracing::error!(
                    correlation_id = %correlation_id,
                    method = %method,
                    path = %path,
                    query = %query,
                    remote = %remote,
                    user_agent = %user_agent,
                    status = status.as_u16(),
                    latency_ms,
                    "request failed"
                );
            } else if status.is_client_error() {
                tracing::warn!(
                    correlation_id = %correlation_id,
                    method = %method,
                    path = %path,
                    query = %query,
                    remote = %remote,
                    user_agent = %user_agent,
                    status = status.as_u16(),
                    latency_ms,
                    "request rejected"
                );
            } else {
                tracing::info!(
                    correlation_id = %correlation_id,
                    method = %method,
                    path = %path,
                    query = %query,
                    remote = %remote,
                    user_agent = %user_agent,
                    status = status.as_u16(),
                    latency_ms,
                    "request completed"
                );
            }
            Ok(res)
        })
    }
}
