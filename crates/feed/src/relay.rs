//! Proxy relay: tries the direct URL first, then public CORS relays.

use std::sync::Arc;
use std::time::Duration;

use log::debug;

use crate::error::FeedError;
use crate::transport::{HttpResponse, Transport, DEFAULT_TIMEOUT};

/// Relay prefixes in the order they are tried. The empty prefix is the direct call.
pub const DEFAULT_RELAYS: &[&str] = &[
    "",
    "https://api.allorigins.win/raw?url=",
    "https://corsproxy.io/?",
    "https://cors-anywhere.herokuapp.com/",
];

/// Builds the URL actually requested for one relay prefix.
pub fn relay_url(prefix: &str, target: &str) -> String {
    if prefix.is_empty() {
        target.to_string()
    } else {
        format!("{}{}", prefix, urlencoding::encode(target))
    }
}

/// Puts the direct call at the front of a configured prefix list.
pub fn normalize_prefixes<I, S>(prefixes: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = Vec::new();
    out.push(String::new());
    for prefix in prefixes {
        let prefix = prefix.into();
        let prefix = prefix.trim().to_string();
        if !prefix.is_empty() && !out.contains(&prefix) {
            out.push(prefix);
        }
    }
    out
}

pub struct ProxyRelay {
    transport: Arc<dyn Transport>,
    prefixes: Vec<String>,
    timeout: Duration,
}

impl ProxyRelay {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_prefixes(transport, DEFAULT_RELAYS.iter().copied(), DEFAULT_TIMEOUT)
    }

    pub fn with_prefixes<I, S>(transport: Arc<dyn Transport>, prefixes: I, timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            transport,
            prefixes: normalize_prefixes(prefixes),
            timeout,
        }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Returns the first 2xx response across all prefixes.
    ///
    /// Timeouts, network errors and bad statuses only advance to the next
    /// prefix; the caller sees a single `AllRelaysFailed` once they are exhausted.
    pub async fn relay(&self, target: &str) -> Result<HttpResponse, FeedError> {
        for prefix in &self.prefixes {
            let label = if prefix.is_empty() { "direct" } else { prefix.as_str() };
            let url = relay_url(prefix, target);
            debug!("Trying {} via {}", target, label);

            match self.transport.get(&url, self.timeout).await {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) => {
                    debug!("Relay {} returned status {}, trying next", label, response.status);
                }
                Err(e) => {
                    debug!("Relay {} failed: {}, trying next", label, e);
                }
            }
        }

        Err(FeedError::AllRelaysFailed {
            url: target.to_string(),
            attempts: self.prefixes.len(),
        })
    }
}
