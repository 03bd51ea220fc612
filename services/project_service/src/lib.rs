//! Owner-scoped project CRUD.

pub mod handlers;
pub mod models;
pub mod repository;

pub use repository::ProjectRepository;

pub fn config(cfg: &mut actix_web::web::ServiceConfig) {
    use crate::handlers::*;

    cfg.service(
        actix_web::web::scope("/projects")
            .route("", actix_web::web::post().to(create_project))
            .route("", actix_web::web::get().to(list_projects))
            .route("/{id}", actix_web::web::get().to(get_project))
            .route("/{id}", actix_web::web::put().to(update_project))
            .route("/{id}", actix_web::web::delete().to(delete_project)),
    );
}
