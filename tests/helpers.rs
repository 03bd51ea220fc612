//! Shared fixtures for the DB-backed integration tests.

use sqlx::PgPool;

/// Connect to the database named by `TEST_DATABASE_URL`. Panics with a clear
/// message when the variable is missing so a misconfigured CI run fails fast.
pub async fn test_pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set for integration tests");
    shared_database::create_pool(&url, Default::default())
        .await
        .expect("failed to connect to the integration-test database")
}
