use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Connection-pool sizing knobs, all optional with conservative defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolSettings {
    pub min_connections: Option<u32>,
    pub max_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
}

/// Build the Postgres pool used by all repositories.
pub async fn create_pool(database_url: &str, settings: PoolSettings) -> Result<PgPool, sqlx::Error> {
    let min_connections = settings.min_connections.unwrap_or(5);
    let max_connections = settings.max_connections.unwrap_or(20);

    // min must not exceed max; clamp and warn rather than fail startup.
    let validated_min = if min_connections > max_connections {
        tracing::warn!(
            "db min_connections ({}) > max_connections ({}), adjusting min to {}",
            min_connections,
            max_connections,
            max_connections
        );
        max_connections
    } else {
        min_connections
    };

    PgPoolOptions::new()
        .min_connections(validated_min)
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs.unwrap_or(30)))
        .connect(database_url)
        .await
}
