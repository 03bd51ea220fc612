use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use serde::Serialize;
use shared_errors::AppError;
use std::future::{ready, Ready};

use crate::entities::{Role, User};

/// The identity resolved for a request.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for AuthenticatedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Per-request security context.
///
/// Owned by the request: the authentication filter inserts it into the
/// request extensions and it is dropped with the request. Handlers assert
/// authorization explicitly via [`SecurityContext::require_user`].
#[derive(Debug, Clone, Default)]
pub struct SecurityContext {
    user: Option<AuthenticatedUser>,
    correlation_id: String,
}

impl SecurityContext {
    pub fn anonymous(correlation_id: impl Into<String>) -> Self {
        Self {
            user: None,
            correlation_id: correlation_id.into(),
        }
    }

    pub fn authenticated(user: AuthenticatedUser, correlation_id: impl Into<String>) -> Self {
        Self {
            user: Some(user),
            correlation_id: correlation_id.into(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.user.is_none()
    }

    pub fn user(&self) -> Option<&AuthenticatedUser> {
        self.user.as_ref()
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Explicit authorization assertion for protected handlers.
    pub fn require_user(&self) -> Result<&AuthenticatedUser, AppError> {
        self.user.as_ref().ok_or(AppError::Authentication)
    }

    /// Role assertion for admin-only operations.
    pub fn require_role(&self, role: Role) -> Result<&AuthenticatedUser, AppError> {
        let user = self.require_user()?;
        if user.role == role || user.role == Role::Admin {
            Ok(user)
        } else {
            Err(AppError::Authorization("Access denied".to_string()))
        }
    }
}

/// Extracting a [`SecurityContext`] never fails; requests that did not pass
/// the authentication filter yield an anonymous context.
impl FromRequest for SecurityContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let ctx = req
            .extensions()
            .get::<SecurityContext>()
            .cloned()
            .unwrap_or_default();
        ready(Ok(ctx))
    }
}
