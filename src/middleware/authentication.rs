use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpMessage};
use auth_service::{bearer_token_from_request, TokenService, UserDirectory};
use futures_util::future::LocalBoxFuture;
use shared_models::{AuthenticatedUser, SecurityContext};
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::middleware::correlation::CorrelationId;

/// Populates the per-request [`SecurityContext`] from a bearer token.
///
/// This filter never fails a request: any extraction, parse, lookup, or
/// validation failure leaves the context anonymous and lets downstream
/// authorization decide. It also never overwrites a context that is already
/// populated.
pub struct AuthenticationFilter {
    tokens: Arc<TokenService>,
    directory: Arc<dyn UserDirectory>,
}

impl AuthenticationFilter {
    pub fn new(tokens: Arc<TokenService>, directory: Arc<dyn UserDirectory>) -> Self {
        Self { tokens, directory }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthenticationFilter
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticationFilterService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticationFilterService {
            service: Rc::new(service),
            tokens: self.tokens.clone(),
            directory: self.directory.clone(),
        }))
    }
}

pub struct AuthenticationFilterService<S> {
    service: Rc<S>,
    tokens: Arc<TokenService>,
    directory: Arc<dyn UserDirectory>,
}

impl<S, B> Service<ServiceRequest> for AuthenticationFilterService<S>
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
        let tokens = self.tokens.clone();
        let directory = self.directory.clone();

        Box::pin(async move {
            let correlation_id = req
                .extensions()
                .get::<CorrelationId>()
                .map(|c| c.0.clone())
                .unwrap_or_default();

            let already_populated = req
                .extensions()
                .get::<SecurityContext>()
                .map(|ctx| !ctx.is_anonymous())
                .unwrap_or(false);

            if !already_populated {
                let ctx = resolve_context(&req, &tokens, directory.as_ref(), &correlation_id).await;
                req.extensions_mut().insert(ctx);
            }

            service.call(req).await
        })
    }
}

async fn resolve_context(
    req: &ServiceRequest,
    tokens: &TokenService,
    directory: &dyn UserDirectory,
    correlation_id: &str,
) -> SecurityContext {
    let token = match bearer_token_from_request(req.request()) {
        Some(token) => token,
        None => return SecurityContext::anonymous(correlation_id),
    };

    let subject = match tokens.parse_subject(&token) {
        Ok(subject) => subject,
        Err(e) => {
            tracing::debug!(correlation_id, "bearer token rejected: {}", e);
            return SecurityContext::anonymous(correlation_id);
        }
    };

    let user = match directory.find_by_username(&subject).await {
        Ok(Some(user)) if user.enabled => user,
        Ok(_) => {
            tracing::debug!(correlation_id, "token subject has no enabled identity");
            return SecurityContext::anonymous(correlation_id);
        }
        Err(e) => {
            tracing::debug!(correlation_id, "identity lookup failed: {}", e);
            return SecurityContext::anonymous(correlation_id);
        }
    };

    if !tokens.is_valid_for(&token, &user) {
        return SecurityContext::anonymous(correlation_id);
    }

    SecurityContext::authenticated(AuthenticatedUser::from(&user), correlation_id)
}
