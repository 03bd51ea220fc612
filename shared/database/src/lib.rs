//! Database pool construction shared by all services.

pub mod connection;

pub use connection::{create_pool, PoolSettings};
