use std::time::Duration;

use crate::relay::DEFAULT_RELAYS;
use crate::retry::RetryPolicy;
use crate::transport::DEFAULT_TIMEOUT;

/// Tunables for one fetch orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    /// Deadline for a single HTTP request.
    pub request_timeout: Duration,
    /// Relay prefixes. The direct call is always tried first regardless.
    pub relays: Vec<String>,
    pub cache_ttl: Duration,
    /// Failed sources are forgotten once this long has passed without a success.
    pub health_reset_after: Duration,
    /// Attempts per source, retries included.
    pub source_attempts: u32,
    pub retry: RetryPolicy,
    /// Source ids left out of the chain.
    pub disabled_sources: Vec<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_TIMEOUT,
            relays: DEFAULT_RELAYS.iter().map(|r| r.to_string()).collect(),
            cache_ttl: Duration::from_secs(60),
            health_reset_after: Duration::from_secs(300),
            source_attempts: 2,
            retry: RetryPolicy::default(),
            disabled_sources: Vec::new(),
        }
    }
}

impl FeedConfig {
    pub fn is_enabled(&self, source_id: &str) -> bool {
        !self
            .disabled_sources
            .iter()
            .any(|d| d.trim().eq_ignore_ascii_case(source_id))
    }
}
