//! Error taxonomy for the fetch pipeline.
//!
//! Each variant is absorbed by exactly one layer:
//! - `Timeout`, `Network`, `HttpStatus`: the proxy relay, which moves on to the next prefix
//! - `AllRelaysFailed`, `Parse`: the retry policy, which repeats the whole source attempt
//! - `SourceUnavailable`: the orchestrator, which advances to the next source

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    /// The transport deadline elapsed before a response arrived.
    #[error("Timeout after {}ms: {url}", .after.as_millis())]
    Timeout { url: String, after: Duration },

    /// Connection refused, DNS failure, body read failure and the like.
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    /// The server answered, but not with a 2xx status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// Every relay prefix failed for one target URL.
    #[error("All relays failed for {url} ({attempts} attempts)")]
    AllRelaysFailed { url: String, attempts: usize },

    /// The response body did not match the shape the source adapter expects.
    #[error("Parse error from {source_id}: {message}")]
    Parse { source_id: String, message: String },

    /// A source could not produce data after exhausting its retries.
    #[error("Source unavailable: {source_id} - {reason}")]
    SourceUnavailable { source_id: String, reason: String },
}

impl FeedError {
    pub fn parse(source_id: &str, message: impl Into<String>) -> Self {
        FeedError::Parse {
            source_id: source_id.to_string(),
            message: message.into(),
        }
    }

    /// Escalates whatever the last attempt failed with into a source-level failure.
    pub fn into_source_unavailable(self, source_id: &str) -> Self {
        match self {
            FeedError::SourceUnavailable { .. } => self,
            other => FeedError::SourceUnavailable {
                source_id: source_id.to_string(),
                reason: other.to_string(),
            },
        }
    }
}
