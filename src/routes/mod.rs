use actix_web::web;

use crate::middleware::csrf;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/health",
        web::get().to(|| async {
            actix_web::web::Json(serde_json::json!({
                "status": "healthy",
                "service": "organizer-api",
                "version": env!("CARGO_PKG_VERSION")
            }))
        }),
    );

    cfg.service(
        web::scope("/api")
            .route("/auth/csrf-token", web::get().to(csrf::csrf_token))
            .configure(auth_service::config)
            .service(
                web::scope("/v1")
                    .configure(contact_service::config)
                    .configure(task_service::config)
                    .configure(appointment_service::config)
                    .configure(project_service::config),
            ),
    );
}
