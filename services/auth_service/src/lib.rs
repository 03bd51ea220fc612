//! Authentication service: token minting/validation, user directory, and the
//! `/api/auth` HTTP surface.

pub mod clock;
pub mod cookies;
pub mod directory;
pub mod handlers;
pub mod jwt;
pub mod models;

pub use clock::{Clock, ManualClock, SystemClock};
pub use directory::{InMemoryUserDirectory, NewUser, PgUserDirectory, UserDirectory};
pub use jwt::{bearer_token_from_request, TokenConfig, TokenError, TokenService};

pub fn config(cfg: &mut actix_web::web::ServiceConfig) {
    use crate::handlers::*;

    cfg.service(
        actix_web::web::scope("/auth")
            .route("/register", actix_web::web::post().to(register))
            .route("/login", actix_web::web::post().to(login))
            .route("/logout", actix_web::web::post().to(logout))
            .route("/refresh", actix_web::web::post().to(refresh)),
    );
}
