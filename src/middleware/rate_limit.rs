use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::Method;
use actix_web::{Error, HttpMessage, ResponseError};
use futures_util::future::LocalBoxFuture;
use shared_errors::AppError;
use shared_models::SecurityContext;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::rate_limit::{EndpointClass, LayeredRateLimiter};

const FORWARDED_FOR: &str = "X-Forwarded-For";
const REAL_IP: &str = "X-Real-IP";

/// Sentinel key when no address source is available. Requests with this key
/// still share one bucket rather than bypassing the limiter.
pub const UNKNOWN_ADDR: &str = "unknown";

/// Derive the client address: first `X-Forwarded-For` entry, then
/// `X-Real-IP`, then the transport peer address.
///
/// Empty values and the literal string `unknown` are skipped so that
/// misconfigured proxies cannot collapse every caller into one bucket.
pub fn client_ip(req: &ServiceRequest) -> String {
    if let Some(forwarded) = header_str(req, FORWARDED_FOR) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() && !first.eq_ignore_ascii_case(UNKNOWN_ADDR) {
                return first.to_string();
            }
        }
    }

    if let Some(real_ip) = header_str(req, REAL_IP) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() && !real_ip.eq_ignore_ascii_case(UNKNOWN_ADDR) {
            return real_ip.to_string();
        }
    }

    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_ADDR.to_string())
}

fn header_str<'a>(req: &'a ServiceRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|h| h.to_str().ok())
}

fn classify(req: &ServiceRequest) -> Option<EndpointClass> {
    let path = req.path();
    if req.method() == Method::POST {
        if path == "/api/auth/login" {
            return Some(EndpointClass::Login);
        }
        if path == "/api/auth/register" {
            return Some(EndpointClass::Register);
        }
    }
    if path.starts_with("/api/") {
        return Some(EndpointClass::Api);
    }
    None
}

/// Gates admission-sensitive endpoints. Runs after authentication so the
/// general-API class can key on the resolved username.
pub struct RateLimitFilter {
    limiter: Arc<LayeredRateLimiter>,
}

impl RateLimitFilter {
    pub fn new(limiter: Arc<LayeredRateLimiter>) -> Self {
        Self { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitFilter
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitFilterService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitFilterService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitFilterService<S> {
    service: Rc<S>,
    limiter: Arc<LayeredRateLimiter>,
}

impl<S, B> Service<ServiceRequest> for RateLimitFilterService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let limiter = self.limiter.clone();

        Box::pin(async move {
            let decision = match classify(&req) {
                Some(EndpointClass::Login) => {
                    Some((EndpointClass::Login, client_ip(&req)))
                }
                Some(EndpointClass::Register) => {
                    Some((EndpointClass::Register, client_ip(&req)))
                }
                Some(EndpointClass::Api) => {
                    // Anonymous API traffic is not keyed by address: that
                    // would conflate rate classes. Authorization downstream
                    // rejects it instead.
                    req.extensions()
                        .get::<SecurityContext>()
                        .and_then(|ctx| ctx.user().map(|u| u.username.clone()))
                        .map(|username| (EndpointClass::Api, username))
                }
                None => None,
            };

            if let Some((class, key)) = decision {
                if let Err(retry_after_secs) = limiter.try_acquire(class, &key) {
                    tracing::warn!(
                        class = ?class,
                        retry_after_secs,
                        "rate limit exceeded"
                    );
                    let response =
                        AppError::RateLimited { retry_after_secs }.error_response();
                    return Ok(req.into_response(response).map_into_right_body());
                }
            }

            service.call(req).await.map(|res| res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::BucketSettings;
    use actix_web::http::header;
    use actix_web::{test, web, App, HttpResponse};
    use auth_service::ManualClock;
    use shared_models::{AuthenticatedUser, Role};

    fn limiter() -> Arc<LayeredRateLimiter> {
        Arc::new(LayeredRateLimiter::new(
            BucketSettings::new(5, 5, 60_000),
            BucketSettings::new(3, 3, 60_000),
            BucketSettings::new(2, 2, 60_000),
            100,
            Arc::new(ManualClock::new(0)),
        ))
    }

    /// Simulates the authentication filter for the general-API class.
    async fn seed_identity(req: &ServiceRequest, username: &str) {
        req.extensions_mut().insert(SecurityContext::authenticated(
            AuthenticatedUser {
                id: 1,
                username: username.to_string(),
                email: format!("{}@example.com", username),
                role: Role::User,
            },
            "test",
        ));
    }

    #[actix_web::test]
    async fn test_sixth_login_attempt_from_same_ip_is_429() {
        let app = test::init_service(
            App::new()
                .wrap(RateLimitFilter::new(limiter()))
                .route("/api/auth/login", web::post().to(HttpResponse::Ok)),
        )
        .await;

        for _ in 0..5 {
            let req = test::TestRequest::post()
                .uri("/api/auth/login")
                .insert_header((FORWARDED_FOR, "203.0.113.5"))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 200);
        }

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .insert_header((FORWARDED_FOR, "203.0.113.5"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 429);
        assert_eq!(resp.headers().get(header::RETRY_AFTER).unwrap(), "60");
        assert!(resp
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("application/json"));

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Rate limit exceeded");
        assert_eq!(body["retryAfter"], 60);
    }

    #[actix_web::test]
    async fn test_different_ips_do_not_share_buckets() {
        let app = test::init_service(
            App::new()
                .wrap(RateLimitFilter::new(limiter()))
                .route("/api/auth/login", web::post().to(HttpResponse::Ok)),
        )
        .await;

        for i in 0..20 {
            let req = test::TestRequest::post()
                .uri("/api/auth/login")
                .insert_header((FORWARDED_FOR, format!("203.0.113.{}", i)))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 200);
        }
    }

    #[actix_web::test]
    async fn test_anonymous_api_traffic_is_not_limited_here() {
        let app = test::init_service(
            App::new()
                .wrap(RateLimitFilter::new(limiter()))
                .route("/api/v1/contacts", web::get().to(HttpResponse::Ok)),
        )
        .await;

        // Capacity for the api class is 2 in this fixture; anonymous
        // requests sail past it.
        for _ in 0..10 {
            let resp = test::call_service(
                &app,
                test::TestRequest::get().uri("/api/v1/contacts").to_request(),
            )
            .await;
            assert_eq!(resp.status(), 200);
        }
    }

    #[actix_web::test]
    async fn test_non_api_paths_are_unlimited() {
        let app = test::init_service(
            App::new()
                .wrap(RateLimitFilter::new(limiter()))
                .route("/health", web::get().to(HttpResponse::Ok)),
        )
        .await;

        for _ in 0..50 {
            let resp = test::call_service(
                &app,
                test::TestRequest::get().uri("/health").to_request(),
            )
            .await;
            assert_eq!(resp.status(), 200);
        }
    }

    #[::std::prelude::v1::test]
    fn test_client_ip_prefers_first_forwarded_entry() {
        let req = test::TestRequest::get()
            .insert_header((FORWARDED_FOR, "198.51.100.7, 10.0.0.1"))
            .insert_header((REAL_IP, "192.0.2.9"))
            .to_srv_request();
        assert_eq!(client_ip(&req), "198.51.100.7");
    }

    #[::std::prelude::v1::test]
    fn test_client_ip_skips_unknown_forwarded_value() {
        let req = test::TestRequest::get()
            .insert_header((FORWARDED_FOR, "unknown"))
            .insert_header((REAL_IP, "192.0.2.9"))
            .to_srv_request();
        assert_eq!(client_ip(&req), "192.0.2.9");
    }

    #[::std::prelude::v1::test]
    fn test_client_ip_falls_back_to_sentinel() {
        let req = test::TestRequest::get().to_srv_request();
        // Test requests have no peer address and no headers.
        assert_eq!(client_ip(&req), UNKNOWN_ADDR);
    }

    #[::std::prelude::v1::test]
    fn test_classify_matches_endpoint_classes() {
        let login = test::TestRequest::post()
            .uri("/api/auth/login")
            .to_srv_request();
        assert_eq!(classify(&login), Some(EndpointClass::Login));

        let register = test::TestRequest::post()
            .uri("/api/auth/register")
            .to_srv_request();
        assert_eq!(classify(&register), Some(EndpointClass::Register));

        let api = test::TestRequest::get()
            .uri("/api/v1/tasks")
            .to_srv_request();
        assert_eq!(classify(&api), Some(EndpointClass::Api));

        let other = test::TestRequest::get().uri("/health").to_srv_request();
        assert_eq!(classify(&other), None);
    }

    #[actix_web::test]
    async fn test_api_class_keys_on_username() {
        let limiter = limiter();
        // Drive the table directly the way the middleware would after
        // authentication: two users, independent budgets.
        for _ in 0..2 {
            assert!(limiter.try_acquire(EndpointClass::Api, "alice").is_ok());
        }
        assert!(limiter.try_acquire(EndpointClass::Api, "alice").is_err());
        assert!(limiter.try_acquire(EndpointClass::Api, "bob").is_ok());

        // seed_identity is exercised by the full-stack tests in lib.rs; keep
        // the helper referenced here.
        let req = test::TestRequest::get().uri("/api/v1/tasks").to_srv_request();
        seed_identity(&req, "alice").await;
        assert!(req.extensions().get::<SecurityContext>().is_some());
    }
}
