//! Owner-scoped contact CRUD.

pub mod handlers;
pub mod models;
pub mod repository;

pub use repository::ContactRepository;

pub fn config(cfg: &mut actix_web::web::ServiceConfig) {
    use crate::handlers::*;

    cfg.service(
        actix_web::web::scope("/contacts")
            .route("", actix_web::web::post().to(create_contact))
            .route("", actix_web::web::get().to(list_contacts))
            .route("/{id}", actix_web::web::get().to(get_contact))
            .route("/{id}", actix_web::web::put().to(update_contact))
            .route("/{id}", actix_web::web::delete().to(delete_contact)),
    );
}
