//! Owner-scoped task CRUD.

pub mod handlers;
pub mod models;
pub mod repository;

pub use repository::TaskRepository;

pub fn config(cfg: &mut actix_web::web::ServiceConfig) {
    use crate::handlers::*;

    cfg.service(
        actix_web::web::scope("/tasks")
            .route("", actix_web::web::post().to(create_task))
            .route("", actix_web::web::get().to(list_tasks))
            .route("/{id}", actix_web::web::get().to(get_task))
            .route("/{id}", actix_web::web::put().to(update_task))
            .route("/{id}", actix_web::web::delete().to(delete_task)),
    );
}
