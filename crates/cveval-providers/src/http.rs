//! Shared HTTP client construction, grounded on the teacher's
//! `HttpClientConfig`/`HttpClientProvider` port: pooled connections with a
//! total-request timeout, reused by every HTTP-backed provider in this crate.

use std::time::Duration;

/// Connection pooling and timeout settings for an outbound HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Maximum idle connections kept open per host.
    pub max_idle_per_host: usize,
    /// How long an idle pooled connection is kept before being closed.
    pub idle_timeout: Duration,
    /// TCP keep-alive duration.
    pub keepalive: Duration,
    /// Total timeout for a single request, including connect + body.
    pub timeout: Duration,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 10,
            idle_timeout: Duration::from_secs(90),
            keepalive: Duration::from_secs(60),
            timeout: Duration::from_secs(30),
            user_agent: "cveval-worker/0.1".to_owned(),
        }
    }
}

/// Build a pooled [`reqwest::Client`] from `config`.
///
/// # Errors
/// Returns an error if the underlying TLS backend fails to initialize.
pub fn build_client(config: &HttpClientConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(config.max_idle_per_host)
        .pool_idle_timeout(config.idle_timeout)
        .tcp_keepalive(config.keepalive)
        .timeout(config.timeout)
        .user_agent(&config.user_agent)
        .build()
}
