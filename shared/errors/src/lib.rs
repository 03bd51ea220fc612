//! Shared error taxonomy for the organizer backend.
//!
//! Every service and middleware layer converts its failures into [`AppError`]
//! so that a single projection site renders the wire shape.

pub mod error_types;

pub use error_types::AppError;
