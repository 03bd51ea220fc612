use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use tracing::{error, info};

use auth_service::handlers::AuthSettings;
use auth_service::{PgUserDirectory, SystemClock, TokenConfig, TokenService, UserDirectory};
use organizer_backend::config::Config;
use organizer_backend::middleware::{
    json_config, json_error_hook, path_config, query_config, AuthenticationFilter,
    CorrelationFilter, CsrfFilter, CsrfSettings, RateLimitFilter,
};
use organizer_backend::observability::{MaskingFormat, RequestLogger};
use organizer_backend::rate_limit::{BucketSettings, LayeredRateLimiter};
use organizer_backend::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        ))
        .event_format(MaskingFormat::new(
            tracing_subscriber::fmt::format::Format::default(),
        ))
        .init();

    info!("Starting organizer backend...");

    let config = Config::from_env().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        std::process::exit(1);
    });

    let clock = Arc::new(SystemClock);

    // The signing key is resolved once here; a missing or short key refuses
    // to start rather than serving unverifiable tokens.
    let tokens = Arc::new(
        TokenService::new(
            TokenConfig::new(
                config.jwt_secret.clone(),
                config.jwt_expiration,
                config.jwt_refresh_window,
            ),
            clock.clone(),
        )
        .unwrap_or_else(|e| {
            error!("Failed to initialize token service: {}", e);
            std::process::exit(1);
        }),
    );

    let limiter = Arc::new(LayeredRateLimiter::new(
        BucketSettings::new(
            config.rate_limit_login_capacity,
            config.rate_limit_login_capacity,
            config.rate_limit_login_period_ms,
        ),
        BucketSettings::new(
            config.rate_limit_register_capacity,
            config.rate_limit_register_capacity,
            config.rate_limit_register_period_ms,
        ),
        BucketSettings::new(
            config.rate_limit_api_capacity,
            config.rate_limit_api_capacity,
            config.rate_limit_api_period_ms,
        ),
        config.rate_limit_max_entries,
        clock,
    ));

    let pool = shared_database::create_pool(&config.database_url, Default::default())
        .await
        .unwrap_or_else(|e| {
            error!("Failed to create database pool: {}", e);
            std::process::exit(1);
        });

    let directory: Arc<dyn UserDirectory> = Arc::new(PgUserDirectory::new(pool.clone()));

    let auth_settings = AuthSettings {
        cookie_secure: config.cookie_secure,
    };
    let csrf_settings = CsrfSettings {
        secure_cookie: config.cookie_secure,
    };

    let host = config.host.clone();
    let port = config.port;

    let server = HttpServer::new(move || {
        let cors_origins = config.cors_allowed_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                let origin_str = origin.to_str().unwrap_or("");
                cors_origins.iter().any(|o| o == origin_str)
            })
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::ACCEPT,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::HeaderName::from_static("x-xsrf-token"),
                actix_web::http::header::HeaderName::from_static("x-correlation-id"),
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::from(directory.clone()))
            .app_data(web::Data::from(tokens.clone()))
            .app_data(web::Data::new(auth_settings.clone()))
            .app_data(web::Data::new(contact_service::ContactRepository::new(
                pool.clone(),
            )))
            .app_data(web::Data::new(task_service::TaskRepository::new(
                pool.clone(),
            )))
            .app_data(web::Data::new(
                appointment_service::AppointmentRepository::new(pool.clone()),
            ))
            .app_data(web::Data::new(project_service::ProjectRepository::new(
                pool.clone(),
            )))
            .app_data(json_config())
            .app_data(path_config())
            .app_data(query_config())
            // Last-registered wrap runs first, so the runtime order is:
            // request logger, correlation, authentication, rate limiting,
            // CSRF, CORS, then the JSON error hook just outside the routes.
            .wrap(json_error_hook())
            .wrap(cors)
            .wrap(CsrfFilter::new(csrf_settings.clone()))
            .wrap(RateLimitFilter::new(limiter.clone()))
            .wrap(AuthenticationFilter::new(
                tokens.clone(),
                directory.clone(),
            ))
            .wrap(CorrelationFilter)
            .wrap(RequestLogger)
            .configure(routes::config)
            .service(
                actix_files::Files::new("/", config.static_dir.clone())
                    .index_file("index.html"),
            )
    })
    .bind((host.as_str(), port))?
    .run();

    info!("Server listening on http://{}:{}", host, port);

    server.await
}
