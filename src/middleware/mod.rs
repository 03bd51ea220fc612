pub mod authentication;
pub mod correlation;
pub mod csrf;
pub mod error_handler;
pub mod rate_limit;

pub use authentication::AuthenticationFilter;
pub use correlation::{CorrelationFilter, CorrelationId, CORRELATION_HEADER};
pub use csrf::{CsrfFilter, CsrfSettings, XSRF_COOKIE, XSRF_HEADER};
pub use error_handler::{json_config, json_error_hook, path_config, query_config, ErrorResponse};
pub use rate_limit::RateLimitFilter;
