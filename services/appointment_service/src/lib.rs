//! Owner-scoped appointment CRUD.

pub mod handlers;
pub mod models;
pub mod repository;

pub use repository::AppointmentRepository;

pub fn config(cfg: &mut actix_web::web::ServiceConfig) {
    use crate::handlers::*;

    cfg.service(
        actix_web::web::scope("/appointments")
            .route("", actix_web::web::post().to(create_appointment))
            .route("", actix_web::web::get().to(list_appointments))
            .route("/{id}", actix_web::web::get().to(get_appointment))
            .route("/{id}", actix_web::web::put().to(update_appointment))
            .route("/{id}", actix_web::web::delete().to(delete_appointment)),
    );
}
