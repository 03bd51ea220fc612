use serde::{Deserialize, Deserializer};
use shared_errors::AppError;

/// Application configuration, loaded from the environment (with `__` as the
/// nesting separator) plus any `.env` file picked up at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    pub database_url: String,

    /// Signing key, base64 or raw; at least 256 bits after decoding.
    pub jwt_secret: String,
    /// Access-token TTL in milliseconds.
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration: i64,
    /// Post-expiration refresh grace in milliseconds.
    #[serde(default = "default_jwt_refresh_window")]
    pub jwt_refresh_window: i64,

    #[serde(deserialize_with = "deserialize_comma_separated", default)]
    pub cors_allowed_origins: Vec<String>,

    /// Force the `Secure` flag on issued cookies.
    #[serde(default = "default_cookie_secure")]
    pub cookie_secure: bool,

    #[serde(default = "default_login_capacity")]
    pub rate_limit_login_capacity: u32,
    #[serde(default = "default_login_period")]
    pub rate_limit_login_period_ms: i64,
    #[serde(default = "default_register_capacity")]
    pub rate_limit_register_capacity: u32,
    #[serde(default = "default_register_period")]
    pub rate_limit_register_period_ms: i64,
    #[serde(default = "default_api_capacity")]
    pub rate_limit_api_capacity: u32,
    #[serde(default = "default_api_period")]
    pub rate_limit_api_period_ms: i64,
    /// Per-class bucket-table cap.
    #[serde(default = "default_max_entries")]
    pub rate_limit_max_entries: usize,

    /// Directory the SPA bundle is served from.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    #[serde(default = "default_app_env")]
    pub app_env: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_jwt_expiration() -> i64 {
    1_800_000
}
fn default_jwt_refresh_window() -> i64 {
    300_000
}
fn default_cookie_secure() -> bool {
    true
}
fn default_login_capacity() -> u32 {
    5
}
fn default_login_period() -> i64 {
    60_000
}
fn default_register_capacity() -> u32 {
    3
}
fn default_register_period() -> i64 {
    60_000
}
fn default_api_capacity() -> u32 {
    100
}
fn default_api_period() -> i64 {
    60_000
}
fn default_max_entries() -> usize {
    10_000
}
fn default_static_dir() -> String {
    "./static".to_string()
}
fn default_app_env() -> String {
    "development".to_string()
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| AppError::Configuration(e.to_string()))
    }
}

/// Accepts both `"a, b"` and `["a", "b"]` for list-valued settings.
pub fn deserialize_comma_separated<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct CommaSeparatedVisitor;

    impl<'de> serde::de::Visitor<'de> for CommaSeparatedVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a comma-separated string or a sequence of strings")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect())
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: serde::de::SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(elem) = seq.next_element::<String>()? {
                vec.push(elem);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(CommaSeparatedVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct TestConfig {
        #[serde(deserialize_with = "deserialize_comma_separated")]
        origins: Vec<String>,
    }

    #[test]
    fn test_deserialize_comma_separated_string() {
        let json = r#"{"origins": "http://localhost:3000, http://localhost:8080"}"#;
        let config: TestConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config.origins,
            vec![
                "http://localhost:3000".to_string(),
                "http://localhost:8080".to_string()
            ]
        );
    }

    #[test]
    fn test_deserialize_comma_separated_sequence() {
        let json = r#"{"origins": ["http://localhost:3000"]}"#;
        let config: TestConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.origins, vec!["http://localhost:3000".to_string()]);
    }

    #[test]
    fn test_defaults_match_documented_values() {
        let json = r#"{
            "database_url": "postgres://localhost/organizer",
            "jwt_secret": "0123456789abcdef0123456789abcdef-raw"
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.jwt_expiration, 1_800_000);
        assert_eq!(config.jwt_refresh_window, 300_000);
        assert_eq!(config.rate_limit_login_capacity, 5);
        assert_eq!(config.rate_limit_register_capacity, 3);
        assert_eq!(config.rate_limit_api_capacity, 100);
        assert_eq!(config.rate_limit_max_entries, 10_000);
        assert!(config.cookie_secure);
        assert_eq!(config.port, 8080);
    }
}
