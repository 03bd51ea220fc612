use actix_web::HttpRequest;
use base64::Engine;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared_errors::AppError;
use shared_models::User;
use std::sync::Arc;
use thiserror::Error;

use crate::clock::Clock;

const BEARER_PREFIX: &str = "Bearer ";

/// Cookie that transports the session token.
pub const AUTH_COOKIE: &str = "auth_token";

/// Minimum effective signing-key length: 256 bits.
const MIN_KEY_BYTES: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,
    #[error("Malformed token")]
    Malformed,
}

/// Session-token claims. `iat` and `exp` are unix epoch milliseconds; the
/// service owns expiration checks, so the values never pass through
/// second-granularity JWT validation.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: String,
    /// Access-token TTL in milliseconds.
    pub access_ttl_ms: i64,
    /// Post-expiration grace window for refresh, in milliseconds.
    pub refresh_window_ms: i64,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>, access_ttl_ms: i64, refresh_window_ms: i64) -> Self {
        Self {
            secret: secret.into(),
            access_ttl_ms,
            refresh_window_ms,
        }
    }
}

/// Mints, parses, and validates session tokens (HMAC-SHA256).
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_ms: i64,
    refresh_window_ms: i64,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Build the service, resolving the signing key once.
    ///
    /// A secret that parses as base64 is decoded; anything else is taken as
    /// raw UTF-8 bytes (backwards-compatibility fallback for pre-base64
    /// deployments). Either way the effective key must be at least 256 bits
    /// or startup fails.
    pub fn new(config: TokenConfig, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        let key = resolve_signing_key(&config.secret)?;
        Ok(Self {
            encoding_key: EncodingKey::from_secret(&key),
            decoding_key: DecodingKey::from_secret(&key),
            access_ttl_ms: config.access_ttl_ms,
            refresh_window_ms: config.refresh_window_ms,
            clock,
        })
    }

    pub fn access_ttl_ms(&self) -> i64 {
        self.access_ttl_ms
    }

    /// Mint a token whose subject is the user's username.
    pub fn issue(&self, user: &User) -> Result<String, AppError> {
        let now = self.clock.now_millis();
        let claims = Claims {
            sub: user.username.clone(),
            iat: now,
            exp: now + self.access_ttl_ms,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("token encoding failed: {}", e)))
    }

    /// Verify the signature and return the subject.
    ///
    /// `Expired` when the expiration has passed, `Malformed` on signature or
    /// structural failure.
    pub fn parse_subject(&self, token: &str) -> Result<String, TokenError> {
        let claims = self.decode_claims(token)?;
        if self.is_expired(&claims) {
            return Err(TokenError::Expired);
        }
        Ok(claims.sub)
    }

    /// True iff the token verifies, the subject equals the user's username
    /// (exact, case-sensitive), and the token has not expired. Expiration is
    /// a `false`, never an error.
    pub fn is_valid_for(&self, token: &str, user: &User) -> bool {
        match self.decode_claims(token) {
            Ok(claims) => claims.sub == user.username && !self.is_expired(&claims),
            Err(_) => false,
        }
    }

    /// True iff the token is currently valid for the user, or expired by no
    /// more than the refresh window with a matching subject. Inspects expired
    /// claims rather than erroring on them.
    pub fn is_refreshable(&self, token: &str, user: &User) -> bool {
        let claims = match self.decode_claims(token) {
            Ok(claims) => claims,
            Err(_) => return false,
        };
        if claims.sub != user.username {
            return false;
        }
        self.clock.now_millis() <= claims.exp + self.refresh_window_ms
    }

    /// Subject of a signature-valid token regardless of expiration; used by
    /// the refresh endpoint to locate the identity before the window check.
    pub fn subject_for_refresh(&self, token: &str) -> Option<String> {
        self.decode_claims(token).ok().map(|c| c.sub)
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, TokenError> {
        // Expiration is checked against the injected clock below, not by the
        // JWT library; decoding must also succeed for expired tokens so the
        // refresh window can inspect their claims.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Malformed)
    }

    // A token is live strictly before its expiration instant: valid on
    // [iat, exp), expired at exp itself.
    fn is_expired(&self, claims: &Claims) -> bool {
        claims.exp <= self.clock.now_millis()
    }
}

fn resolve_signing_key(secret: &str) -> Result<Vec<u8>, AppError> {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return Err(AppError::Configuration(
            "signing key is not configured".to_string(),
        ));
    }

    let key = match base64::engine::general_purpose::STANDARD.decode(trimmed) {
        Ok(decoded) => decoded,
        Err(_) => trimmed.as_bytes().to_vec(),
    };

    if key.len() < MIN_KEY_BYTES {
        return Err(AppError::Configuration(format!(
            "signing key must be at least {} bytes, got {}",
            MIN_KEY_BYTES,
            key.len()
        )));
    }
    Ok(key)
}

/// Locate the bearer token for a request: the `auth_token` cookie first
/// (ignored when empty or whitespace), then the `Authorization` header with
/// the literal `Bearer ` prefix.
pub fn bearer_token_from_request(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(AUTH_COOKIE) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    req.headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_PREFIX))
        .map(|t| t.to_string())
}
