//! Market data fetch core: timeout-bounded transport, proxy relay, retries,
//! per-API source adapters and the failover orchestrator.

pub mod clock;
pub mod config;
pub mod error;
pub mod mock;
pub mod orchestrator;
pub mod relay;
pub mod retry;
pub mod sources;
pub mod transport;

#[cfg(test)]
mod testing;

#[cfg(any(test, feature = "testing"))]
pub use clock::ManualClock;
pub use clock::{Clock, SystemClock};
pub use config::FeedConfig;
pub use error::FeedError;
pub use mock::{minute_of_day, synthetic_coins};
pub use orchestrator::{AttemptResult, DataOrigin, FetchOrchestrator, FetchOutcome, SourceAttempt, SourceHealth};
pub use relay::{ProxyRelay, DEFAULT_RELAYS};
pub use retry::RetryPolicy;
pub use sources::{default_sources, CoinSource};
pub use transport::{HttpResponse, ReqwestTransport, Transport};
