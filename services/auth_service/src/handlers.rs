use actix_web::{web, HttpRequest, HttpResponse};
use shared_errors::AppError;
use shared_models::{Role, SecurityContext};
use shared_security::{hash_password, verify_password, PasswordError};
use validator::Validate;

use crate::cookies::{auth_cookie, clear_auth_cookie};
use crate::directory::{NewUser, UserDirectory};
use crate::jwt::{bearer_token_from_request, TokenService};
use crate::models::{AuthResponse, LoginRequest, RegisterRequest};

/// Runtime knobs the auth handlers need beyond the token service itself.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub cookie_secure: bool,
}

pub async fn login(
    body: web::Json<LoginRequest>,
    directory: web::Data<dyn UserDirectory>,
    tokens: web::Data<TokenService>,
    settings: web::Data<AuthSettings>,
    ctx: SecurityContext,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let username = body.username.trim();

    let user = directory
        .find_by_username(username)
        .await?
        .filter(|u| u.enabled)
        .ok_or(AppError::Authentication)?;

    match verify_password(&body.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => return Err(AppError::Authentication),
        Err(e) => {
            // Corrupted credential row. Mask the identifier before logging.
            tracing::error!(
                correlation_id = ctx.correlation_id(),
                user = %mask_identifier(&user.username),
                "password verification failed: {}",
                e
            );
            return Err(match e {
                PasswordError::NotBcrypt => {
                    AppError::internal("stored credential is not a bcrypt hash")
                }
                other => AppError::internal(other.to_string()),
            });
        }
    }

    let token = tokens.issue(&user)?;
    let expires_in_secs = tokens.access_ttl_ms() / 1000;

    tracing::info!(
        correlation_id = ctx.correlation_id(),
        user = %mask_identifier(&user.username),
        "login succeeded"
    );

    Ok(HttpResponse::Ok()
        .cookie(auth_cookie(&token, expires_in_secs, settings.cookie_secure))
        .json(AuthResponse::new(token, &user, expires_in_secs)))
}

pub async fn register(
    body: web::Json<RegisterRequest>,
    directory: web::Data<dyn UserDirectory>,
    tokens: web::Data<TokenService>,
    settings: web::Data<AuthSettings>,
    ctx: SecurityContext,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    let password_hash =
        hash_password(&body.password).map_err(|e| AppError::internal(e.to_string()))?;

    let user = directory
        .create(NewUser {
            username: body.username.trim().to_string(),
            email: body.email.trim().to_string(),
            password_hash,
            role: Role::User,
        })
        .await?;

    let token = tokens.issue(&user)?;
    let expires_in_secs = tokens.access_ttl_ms() / 1000;

    tracing::info!(
        correlation_id = ctx.correlation_id(),
        user = %mask_identifier(&user.username),
        "identity registered"
    );

    Ok(HttpResponse::Created()
        .cookie(auth_cookie(&token, expires_in_secs, settings.cookie_secure))
        .json(AuthResponse::new(token, &user, expires_in_secs)))
}

pub async fn refresh(
    req: HttpRequest,
    directory: web::Data<dyn UserDirectory>,
    tokens: web::Data<TokenService>,
    settings: web::Data<AuthSettings>,
    ctx: SecurityContext,
) -> Result<HttpResponse, AppError> {
    let presented = bearer_token_from_request(&req).ok_or(AppError::Authentication)?;

    // The presented token may already be expired; locate the identity from
    // its signature-verified claims, then apply the refresh-window check.
    let subject = tokens
        .subject_for_refresh(&presented)
        .ok_or(AppError::Authentication)?;

    let user = directory
        .find_by_username(&subject)
        .await?
        .filter(|u| u.enabled)
        .ok_or(AppError::Authentication)?;

    if !tokens.is_refreshable(&presented, &user) {
        tracing::debug!(
            correlation_id = ctx.correlation_id(),
            "refresh outside the grace window"
        );
        return Err(AppError::Authentication);
    }

    let token = tokens.issue(&user)?;
    let expires_in_secs = tokens.access_ttl_ms() / 1000;

    Ok(HttpResponse::Ok()
        .cookie(auth_cookie(&token, expires_in_secs, settings.cookie_secure))
        .json(AuthResponse::new(token, &user, expires_in_secs)))
}

pub async fn logout(settings: web::Data<AuthSettings>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::NoContent()
        .cookie(clear_auth_cookie(settings.cookie_secure))
        .finish())
}

fn mask_identifier(value: &str) -> String {
    let visible: String = value.chars().take(2).collect();
    if value.chars().count() > 2 {
        format!("{}***", visible)
    } else {
        "***".to_string()
    }
}
