//! End-to-end tests for the assembled admission chain, using the in-memory
//! user directory. Resource endpoints are stood in by probe handlers so the
//! chain can be exercised without a database.

use crate::middleware::csrf::{self, CsrfFilter, CsrfSettings, XSRF_COOKIE, XSRF_HEADER};
use crate::middleware::{
    AuthenticationFilter, CorrelationFilter, RateLimitFilter, CORRELATION_HEADER,
};
use crate::observability::RequestLogger;
use crate::rate_limit::{BucketSettings, LayeredRateLimiter};
use actix_web::http::header;
use actix_web::{test, web, App, HttpResponse};
use auth_service::handlers::AuthSettings;
use auth_service::{
    InMemoryUserDirectory, ManualClock, TokenConfig, TokenService, UserDirectory,
};
use shared_errors::AppError;
use shared_models::{Role, SecurityContext, User};
use shared_security::hash_password_with_cost;
use std::sync::Arc;

const TEST_SECRET: &str = "end-to-end-admission-test-key-0123456789";

struct TestCore {
    tokens: Arc<TokenService>,
    directory: Arc<InMemoryUserDirectory>,
    limiter: Arc<LayeredRateLimiter>,
    clock: Arc<ManualClock>,
}

impl TestCore {
    async fn new() -> Self {
        Self::with_api_capacity(100).await
    }

    async fn with_api_capacity(api_capacity: u32) -> Self {
        let clock = Arc::new(ManualClock::new(0));
        let tokens = Arc::new(
            TokenService::new(
                TokenConfig::new(TEST_SECRET, 1_800_000, 300_000),
                clock.clone(),
            )
            .unwrap(),
        );
        let limiter = Arc::new(LayeredRateLimiter::new(
            BucketSettings::new(5, 5, 60_000),
            BucketSettings::new(3, 3, 60_000),
            BucketSettings::new(api_capacity, api_capacity, 60_000),
            10_000,
            clock.clone(),
        ));

        let directory = Arc::new(InMemoryUserDirectory::new());
        let now = chrono::Utc::now();
        directory
            .insert(User {
                id: 1,
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: hash_password_with_cost("Str0ngP@ss", 4).unwrap(),
                role: Role::User,
                enabled: true,
                created_at: now,
                updated_at: now,
            })
            .await;

        Self {
            tokens,
            directory,
            limiter,
            clock,
        }
    }

    async fn token_for(&self, username: &str) -> String {
        let user = self
            .directory
            .find_by_username(username)
            .await
            .unwrap()
            .unwrap();
        self.tokens.issue(&user).unwrap()
    }
}

async fn create_contact_probe(ctx: SecurityContext) -> Result<HttpResponse, AppError> {
    ctx.require_user()?;
    Ok(HttpResponse::Created().json(serde_json::json!({ "id": 1 })))
}

async fn list_contacts_probe(ctx: SecurityContext) -> Result<HttpResponse, AppError> {
    ctx.require_user()?;
    Ok(HttpResponse::Ok().json(serde_json::json!([])))
}

async fn contact_by_id_probe(
    ctx: SecurityContext,
    id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    ctx.require_user()?;
    Err(AppError::not_found("Contact", *id))
}

/// The production middleware chain in production order, minus CORS and the
/// static file mount.
macro_rules! admission_app {
    ($core:expr) => {{
        let core = &$core;
        App::new()
            .app_data(web::Data::from(
                core.directory.clone() as Arc<dyn UserDirectory>
            ))
            .app_data(web::Data::from(core.tokens.clone()))
            .app_data(web::Data::new(AuthSettings {
                cookie_secure: false,
            }))
            .app_data(crate::middleware::json_config())
            .app_data(crate::middleware::path_config())
            .app_data(crate::middleware::query_config())
            .wrap(crate::middleware::json_error_hook())
            .wrap(CsrfFilter::new(CsrfSettings {
                secure_cookie: false,
            }))
            .wrap(RateLimitFilter::new(core.limiter.clone()))
            .wrap(AuthenticationFilter::new(
                core.tokens.clone(),
                core.directory.clone(),
            ))
            .wrap(CorrelationFilter)
            .wrap(RequestLogger)
            .service(
                web::scope("/api")
                    .route("/auth/csrf-token", web::get().to(csrf::csrf_token))
                    .configure(auth_service::config)
                    .service(
                        web::scope("/v1")
                            .route("/contacts", web::post().to(create_contact_probe))
                            .route("/contacts", web::get().to(list_contacts_probe))
                            .route("/contacts/{id}", web::get().to(contact_by_id_probe)),
                    ),
            )
    }};
}

fn set_cookie_value(resp: &impl CookieSource, name: &str) -> Option<String> {
    resp.set_cookie_headers().into_iter().find_map(|raw| {
        let (pair, _) = raw.split_once(';').unwrap_or((raw.as_str(), ""));
        let (cookie_name, value) = pair.split_once('=')?;
        (cookie_name == name).then(|| value.to_string())
    })
}

trait CookieSource {
    fn set_cookie_headers(&self) -> Vec<String>;
}

impl<B> CookieSource for actix_web::dev::ServiceResponse<B> {
    fn set_cookie_headers(&self) -> Vec<String> {
        self.headers()
            .get_all(header::SET_COOKIE)
            .filter_map(|v| v.to_str().ok())
            .map(|v| v.to_string())
            .collect()
    }
}

#[actix_web::test]
async fn test_login_success_end_to_end() {
    let core = TestCore::new().await;
    let app = test::init_service(admission_app!(core)).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(serde_json::json!({
            "username": "alice",
            "password": "Str0ngP@ss"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    // Session cookie, CSRF cookie, and correlation id all land on the one
    // response.
    let auth_cookie = resp
        .set_cookie_headers()
        .into_iter()
        .find(|c| c.starts_with("auth_token="))
        .unwrap();
    assert!(auth_cookie.contains("HttpOnly"));
    assert!(auth_cookie.contains("SameSite=Lax"));
    assert!(set_cookie_value(&resp, XSRF_COOKIE).is_some());
    assert!(resp.headers().get(CORRELATION_HEADER).is_some());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["role"], "USER");
    assert!(body["token"].as_str().unwrap().contains('.'));
}

#[actix_web::test]
async fn test_sixth_failed_login_is_rate_limited() {
    let core = TestCore::new().await;
    let app = test::init_service(admission_app!(core)).await;

    for _ in 0..5 {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .insert_header(("X-Forwarded-For", "203.0.113.5"))
            .set_json(serde_json::json!({
                "username": "alice",
                "password": "wrong-password"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
    }

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header(("X-Forwarded-For", "203.0.113.5"))
        .set_json(serde_json::json!({
            "username": "alice",
            "password": "wrong-password"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 429);
    assert_eq!(resp.headers().get(header::RETRY_AFTER).unwrap(), "60");

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Rate limit exceeded");
    assert_eq!(body["retryAfter"], 60);

    // A different address is unaffected.
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header(("X-Forwarded-For", "198.51.100.7"))
        .set_json(serde_json::json!({
            "username": "alice",
            "password": "Str0ngP@ss"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn test_csrf_bootstrap_then_write() {
    let core = TestCore::new().await;
    let token = core.token_for("alice").await;
    let app = test::init_service(admission_app!(core)).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/auth/csrf-token")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let csrf = set_cookie_value(&resp, XSRF_COOKIE).unwrap();

    // Write with the header echo: accepted.
    let req = test::TestRequest::post()
        .uri("/api/v1/contacts")
        .cookie(actix_web::cookie::Cookie::new("auth_token", token.clone()))
        .cookie(actix_web::cookie::Cookie::new(XSRF_COOKIE, csrf.clone()))
        .insert_header((XSRF_HEADER, csrf.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    // Same write without the header: rejected.
    let req = test::TestRequest::post()
        .uri("/api/v1/contacts")
        .cookie(actix_web::cookie::Cookie::new("auth_token", token))
        .cookie(actix_web::cookie::Cookie::new(XSRF_COOKIE, csrf))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Invalid or missing CSRF token");
}

#[actix_web::test]
async fn test_refresh_window_end_to_end() {
    let core = TestCore::new().await;
    let clock = core.clock.clone();
    let tokens = TokenService::new(
        TokenConfig::new(TEST_SECRET, 1_000, 5_000),
        clock.clone(),
    )
    .unwrap();
    let core = TestCore {
        tokens: Arc::new(tokens),
        ..core
    };
    let token = core.token_for("alice").await;
    let app = test::init_service(admission_app!(core)).await;

    // A cookieless client presents the expired token as a bearer header; a
    // browser would send its session cookie plus the CSRF header echo.
    clock.set(1_500);
    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    clock.set(7_000);
    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_browser_refresh_with_csrf_echo_succeeds() {
    let core = TestCore::new().await;
    let token = core.token_for("alice").await;
    let app = test::init_service(admission_app!(core)).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/auth/csrf-token")
            .to_request(),
    )
    .await;
    let csrf = set_cookie_value(&resp, XSRF_COOKIE).unwrap();

    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .cookie(actix_web::cookie::Cookie::new("auth_token", token))
        .cookie(actix_web::cookie::Cookie::new(XSRF_COOKIE, csrf.clone()))
        .insert_header((XSRF_HEADER, csrf))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    // The session cookie alone is not enough for a state-changing request.
    let core = TestCore::new().await;
    let token = core.token_for("alice").await;
    let app = test::init_service(admission_app!(core)).await;
    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .cookie(actix_web::cookie::Cookie::new("auth_token", token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn test_correlation_echo_and_replacement() {
    let core = TestCore::new().await;
    let app = test::init_service(admission_app!(core)).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/auth/csrf-token")
            .insert_header((CORRELATION_HEADER, "req-abc_123"))
            .to_request(),
    )
    .await;
    assert_eq!(
        resp.headers().get(CORRELATION_HEADER).unwrap(),
        "req-abc_123"
    );

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/auth/csrf-token")
            .insert_header((CORRELATION_HEADER, "bad value"))
            .to_request(),
    )
    .await;
    let echoed = resp
        .headers()
        .get(CORRELATION_HEADER)
        .unwrap()
        .to_str()
        .unwrap();
    assert_ne!(echoed, "bad value");
    assert!(echoed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
}

#[actix_web::test]
async fn test_api_class_limits_by_username() {
    let core = TestCore::with_api_capacity(2).await;
    let token = core.token_for("alice").await;
    let app = test::init_service(admission_app!(core)).await;

    for _ in 0..2 {
        let req = test::TestRequest::get()
            .uri("/api/v1/contacts")
            .cookie(actix_web::cookie::Cookie::new("auth_token", token.clone()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }

    let req = test::TestRequest::get()
        .uri("/api/v1/contacts")
        .cookie(actix_web::cookie::Cookie::new("auth_token", token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 429);
    assert!(resp.headers().get(header::RETRY_AFTER).is_some());
}

#[actix_web::test]
async fn test_anonymous_api_request_gets_401_not_429() {
    let core = TestCore::with_api_capacity(1).await;
    let app = test::init_service(admission_app!(core)).await;

    for _ in 0..5 {
        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/v1/contacts").to_request(),
        )
        .await;
        assert_eq!(resp.status(), 401);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Invalid credentials");
    }
}

#[actix_web::test]
async fn test_every_error_is_the_json_shape() {
    let core = TestCore::new().await;
    let token = core.token_for("alice").await;
    let app = test::init_service(admission_app!(core)).await;

    // Malformed body -> 400.
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{ not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    assert_json_error_shape(resp, "Bad request").await;

    // Unknown route -> 404.
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/unknown").to_request(),
    )
    .await;
    assert_eq!(resp.status(), 404);
    assert_json_error_shape(resp, "Not found").await;

    // Unparseable path segment -> 400.
    let req = test::TestRequest::get()
        .uri("/api/v1/contacts/not-a-number")
        .cookie(actix_web::cookie::Cookie::new("auth_token", token.clone()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    assert_json_error_shape(resp, "Bad request").await;

    // Domain not-found carries the resource and id.
    let req = test::TestRequest::get()
        .uri("/api/v1/contacts/42")
        .cookie(actix_web::cookie::Cookie::new("auth_token", token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    assert_json_error_shape(resp, "Contact not found: 42").await;
}

async fn assert_json_error_shape<B>(resp: actix_web::dev::ServiceResponse<B>, expected: &str)
where
    B: actix_web::body::MessageBody,
{
    assert!(resp
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], expected);
}
