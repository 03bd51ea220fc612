use actix_web::body::{BoxBody, EitherBody};
use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{self, HeaderValue};
use actix_web::http::Method;
use actix_web::{web, Error, HttpMessage, HttpRequest, HttpResponse, ResponseError};
use base64::Engine;
use futures_util::future::LocalBoxFuture;
use rand::RngCore;
use shared_errors::AppError;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::task::{Context, Poll};
use uuid::Uuid;

pub const XSRF_COOKIE: &str = "XSRF-TOKEN";
pub const XSRF_HEADER: &str = "X-XSRF-TOKEN";

const REJECTION_MESSAGE: &str = "Invalid or missing CSRF token";

/// Paths exempt from CSRF enforcement regardless of method.
const IGNORED_PREFIXES: [&str; 3] = ["/actuator", "/swagger-ui", "/v3/api-docs"];

#[derive(Debug, Clone)]
pub struct CsrfSettings {
    pub secure_cookie: bool,
}

impl Default for CsrfSettings {
    fn default() -> Self {
        Self {
            secure_cookie: true,
        }
    }
}

/// The session's CSRF token, raw. Inserted into the request extensions so the
/// bootstrap handler can surface a masked copy.
#[derive(Debug, Clone)]
pub struct CsrfTokenHandle(pub String);

/// XOR-mask a token with a fresh random pad: `base64(pad || token ^ pad)`.
///
/// Repeated disclosures of the token inside compressed response bodies then
/// never repeat byte-for-byte, which defeats compression side channels. The
/// raw value still travels in the cookie and is accepted raw from the header.
pub fn mask_token(token: &str) -> String {
    let token_bytes = token.as_bytes();
    let mut pad = vec![0u8; token_bytes.len()];
    rand::thread_rng().fill_bytes(&mut pad);

    let mut out = pad.clone();
    out.extend(token_bytes.iter().zip(&pad).map(|(b, p)| b ^ p));
    base64::engine::general_purpose::STANDARD.encode(out)
}

/// Invert [`mask_token`]. Only exercised by tests and kept next to the
/// masking so the two stay in sync.
pub fn unmask_token(masked: &str) -> Option<String> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(masked)
        .ok()?;
    if bytes.len() % 2 != 0 {
        return None;
    }
    let (pad, masked) = bytes.split_at(bytes.len() / 2);
    let token: Vec<u8> = masked.iter().zip(pad).map(|(b, p)| b ^ p).collect();
    String::from_utf8(token).ok()
}

fn tokens_match(a: &str, b: &str) -> bool {
    ring::constant_time::verify_slices_are_equal(a.as_bytes(), b.as_bytes()).is_ok()
}

fn is_ignored(req: &ServiceRequest) -> bool {
    matches!(
        *req.method(),
        Method::GET | Method::HEAD | Method::OPTIONS
    ) || IGNORED_PREFIXES
        .iter()
        .any(|prefix| req.path().starts_with(prefix))
}

/// Double-submit CSRF defense.
///
/// The token lives in a readable `XSRF-TOKEN` cookie that is materialized on
/// every response, so a browser holds it before its first write and carries
/// it on every subsequent request. State-changing requests from a session
/// (one presenting the CSRF cookie or the `auth_token` session cookie) must
/// echo the CSRF cookie value in `X-XSRF-TOKEN`; a first-contact request with
/// neither cookie has no session an attacker could ride.
pub struct CsrfFilter {
    settings: CsrfSettings,
}

impl CsrfFilter {
    pub fn new(settings: CsrfSettings) -> Self {
        Self { settings }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CsrfFilter
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type InitError = ();
    type Transform = CsrfFilterService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CsrfFilterService {
            service: Rc::new(service),
            settings: self.settings.clone(),
        }))
    }
}

pub struct CsrfFilterService<S> {
    service: Rc<S>,
    settings: CsrfSettings,
}

impl<S, B> Service<ServiceRequest> for CsrfFilterService<S>
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
        let settings = self.settings.clone();

        Box::pin(async move {
            let cookie_token = req
                .cookie(XSRF_COOKIE)
                .map(|c| c.value().to_string())
                .filter(|v| !v.trim().is_empty());
            let has_session =
                cookie_token.is_some() || req.cookie(auth_service::jwt::AUTH_COOKIE).is_some();

            let session_token = cookie_token
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            req.extensions_mut()
                .insert(CsrfTokenHandle(session_token.clone()));

            if !is_ignored(&req) && has_session {
                let header_token = req
                    .headers()
                    .get(XSRF_HEADER)
                    .and_then(|h| h.to_str().ok());

                // An authenticated request without the CSRF cookie has
                // nothing to compare against and is rejected outright.
                let accepted = match (&cookie_token, header_token) {
                    (Some(cookie), Some(header)) => tokens_match(cookie, header),
                    _ => false,
                };

                if !accepted {
                    tracing::warn!(
                        path = req.path(),
                        "state-changing request failed CSRF check"
                    );
                    let response = AppError::Authorization(REJECTION_MESSAGE.to_string())
                        .error_response();
                    let mut res = req.into_response(response).map_into_right_body();
                    append_csrf_cookie(&mut res, &session_token, &settings);
                    return Ok(res);
                }
            }

            let mut res = service.call(req).await?.map_into_left_body();
            append_csrf_cookie(&mut res, &session_token, &settings);
            Ok(res)
        })
    }
}

// The cookie is set on every response, not only on writes: browsers need it
// in hand before their first state-changing request.
fn append_csrf_cookie<B>(
    res: &mut ServiceResponse<B>,
    token: &str,
    settings: &CsrfSettings,
) {
    let cookie = Cookie::build(XSRF_COOKIE, token.to_string())
        .path("/")
        .same_site(SameSite::Lax)
        .secure(settings.secure_cookie)
        .finish();

    if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
        res.headers_mut().append(header::SET_COOKIE, value);
    }
}

/// `GET /api/auth/csrf-token`: the SPA bootstrap endpoint. The cookie is set
/// by the filter; the body carries a masked copy plus the header name the
/// client must echo.
pub async fn csrf_token(req: HttpRequest) -> web::Json<serde_json::Value> {
    let token = req
        .extensions()
        .get::<CsrfTokenHandle>()
        .map(|h| h.0.clone())
        .unwrap_or_default();

    web::Json(serde_json::json!({
        "token": mask_token(&token),
        "headerName": XSRF_HEADER,
    }))
}
