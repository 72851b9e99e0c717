//! Source failover with a response cache and a synthetic floor.
//!
//! Sources are tried in priority order, each under the retry policy. The
//! first success wins and is cached. When every source fails the caller gets
//! synthetic coins instead of an error, flagged through [`DataOrigin`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use shared::Coin;

use crate::clock::{elapsed_since, Clock, SystemClock};
use crate::config::FeedConfig;
use crate::mock::{minute_of_day, synthetic_coins};
use crate::relay::ProxyRelay;
use crate::sources::{default_sources, CoinSource};
use crate::transport::{ReqwestTransport, Transport};

/// Where a result set came from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataOrigin {
    Live(String),
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptResult {
    /// Still in the failed set from an earlier pass.
    Skipped,
    Failed(String),
    Succeeded(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceAttempt {
    pub source_id: &'static str,
    pub result: AttemptResult,
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub coins: Vec<Coin>,
    pub origin: DataOrigin,
    pub from_cache: bool,
    pub fetched_at: DateTime<Utc>,
    /// Empty for cache hits.
    pub attempts: Vec<SourceAttempt>,
}

impl FetchOutcome {
    pub fn is_fallback(&self) -> bool {
        self.origin == DataOrigin::Fallback
    }

    pub fn source_id(&self) -> Option<&str> {
        match &self.origin {
            DataOrigin::Live(id) => Some(id),
            DataOrigin::Fallback => None,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    coins: Vec<Coin>,
    fetched_at: DateTime<Utc>,
    origin: DataOrigin,
}

#[derive(Debug, Default)]
pub struct SourceHealth {
    /// Failed source ids and when each was marked.
    failed: HashMap<&'static str, DateTime<Utc>>,
    last_success: Option<DateTime<Utc>>,
    passes: u64,
}

impl SourceHealth {
    pub fn is_failed(&self, source_id: &str) -> bool {
        self.failed.contains_key(source_id)
    }

    /// Failed source ids, sorted.
    pub fn failed(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.failed.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        self.last_success
    }

    /// Network passes run so far; cache hits do not count.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    fn is_stale(&self, now: DateTime<Utc>, after: Duration) -> bool {
        match self.last_success {
            Some(at) => elapsed_since(now, at) > after,
            None => true,
        }
    }

    fn mark_failed(&mut self, source_id: &'static str, at: DateTime<Utc>) {
        self.failed.insert(source_id, at);
    }

    /// Only a primary success clears the whole set.
    fn record_success(&mut self, at: DateTime<Utc>, primary: bool) {
        if primary {
            self.failed.clear();
        }
        self.last_success = Some(at);
    }

    fn reset_if_stale(&mut self, now: DateTime<Utc>, after: Duration) {
        if !self.failed.is_empty() && self.is_stale(now, after) {
            info!("Resetting failed sources list to retry all endpoints");
            self.failed.clear();
        }
    }

    // A source marked longer ago than `after` gets another chance even while
    // others keep succeeding
    fn expire(&mut self, now: DateTime<Utc>, after: Duration) {
        self.failed.retain(|id, at| {
            let keep = elapsed_since(now, *at) <= after;
            if !keep {
                info!("Retrying {} after {}s marked failed", id, after.as_secs());
            }
            keep
        });
    }
}

/// Owns the cache and source health. Callers serialize access through
/// `&mut self`.
pub struct FetchOrchestrator {
    sources: Vec<Arc<dyn CoinSource>>,
    relay: ProxyRelay,
    clock: Arc<dyn Clock>,
    config: FeedConfig,
    cache: Option<CacheEntry>,
    health: SourceHealth,
}

impl FetchOrchestrator {
    /// Live sources over plain HTTP, minus any the config disables.
    pub fn new(config: FeedConfig) -> Self {
        Self::with_transport(Arc::new(ReqwestTransport::default()), config)
    }

    pub fn with_transport(transport: Arc<dyn Transport>, config: FeedConfig) -> Self {
        let sources = default_sources()
            .into_iter()
            .filter(|s| config.is_enabled(s.id()))
            .collect();
        Self::with_parts(sources, transport, Arc::new(SystemClock), config)
    }

    pub fn with_parts(
        sources: Vec<Arc<dyn CoinSource>>,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        config: FeedConfig,
    ) -> Self {
        let relay = ProxyRelay::with_prefixes(transport, config.relays.clone(), config.request_timeout);
        Self {
            sources,
            relay,
            clock,
            config,
            cache: None,
            health: SourceHealth::default(),
        }
    }

    pub fn source_ids(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.id()).collect()
    }

    pub fn health(&self) -> &SourceHealth {
        &self.health
    }

    /// The clock cache ages and synthetic data are stamped with.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Returns the best data available. Never fails: when every source is
    /// down the result is synthetic and `is_fallback()` is set.
    pub async fn fetch_coins(&mut self, force_refresh: bool) -> FetchOutcome {
        let now = self.clock.now();

        if !force_refresh {
            if let Some(entry) = &self.cache {
                let age = elapsed_since(now, entry.fetched_at);
                if age < self.config.cache_ttl {
                    debug!("Using cached data (age: {}s)", age.as_secs());
                    return FetchOutcome {
                        coins: entry.coins.clone(),
                        origin: entry.origin.clone(),
                        from_cache: true,
                        fetched_at: entry.fetched_at,
                        attempts: Vec::new(),
                    };
                }
            }
        }

        self.health.passes += 1;
        self.health.reset_if_stale(now, self.config.health_reset_after);
        self.health.expire(now, self.config.health_reset_after);

        let mut attempts = Vec::with_capacity(self.sources.len());
        let relay = &self.relay;

        for (position, source) in self.sources.iter().enumerate() {
            let source_id = source.id();
            if self.health.is_failed(source_id) {
                debug!("Skipping {} (marked failed)", source_id);
                attempts.push(SourceAttempt {
                    source_id,
                    result: AttemptResult::Skipped,
                });
                continue;
            }

            info!("Trying {}...", source_id);
            let result = self
                .config
                .retry
                .run(self.config.source_attempts, || source.fetch(relay))
                .await;

            match result {
                Ok(coins) => {
                    let fetched_at = self.clock.now();
                    info!("{} returned {} coins", source_id, coins.len());

                    self.health.record_success(fetched_at, position == 0);
                    attempts.push(SourceAttempt {
                        source_id,
                        result: AttemptResult::Succeeded(coins.len()),
                    });

                    let origin = DataOrigin::Live(source_id.to_string());
                    self.cache = Some(CacheEntry {
                        coins: coins.clone(),
                        fetched_at,
                        origin: origin.clone(),
                    });

                    return FetchOutcome {
                        coins,
                        origin,
                        from_cache: false,
                        fetched_at,
                        attempts,
                    };
                }
                Err(e) => {
                    let e = e.into_source_unavailable(source_id);
                    warn!("{}", e);
                    self.health.mark_failed(source_id, self.clock.now());
                    attempts.push(SourceAttempt {
                        source_id,
                        result: AttemptResult::Failed(e.to_string()),
                    });
                }
            }
        }

        let fetched_at = self.clock.now();
        warn!("All sources failed, using synthetic data");
        let coins = synthetic_coins(minute_of_day(fetched_at));

        self.cache = Some(CacheEntry {
            coins: coins.clone(),
            fetched_at,
            origin: DataOrigin::Fallback,
        });
        self.health.reset_if_stale(fetched_at, self.config.health_reset_after);

        FetchOutcome {
            coins,
            origin: DataOrigin::Fallback,
            from_cache: false,
            fetched_at,
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::sources::coingecko::COINGECKO_URL;
    use crate::sources::coinlore::COINLORE_URL;
    use crate::sources::coinpaprika::COINPAPRIKA_URL;
    use crate::sources::coinranking::COINRANKING_URL;
    use crate::testing::ScriptedTransport;
    use chrono::TimeZone;

    const GECKO_BODY: &str = r#"[{"id":"bitcoin","symbol":"btc","name":"Bitcoin",
        "image":"https://img/btc.png","current_price":65000,"market_cap":1280000000000,
        "market_cap_rank":1,"price_change_percentage_24h":1.5,"total_volume":30000000000}]"#;

    const PAPRIKA_BODY: &str = r#"[{"id":"btc-bitcoin","symbol":"BTC","name":"Bitcoin",
        "price_usd":"64990","market_cap_usd":"1279000000000","percent_change_24h":"1.4",
        "volume_24h_usd":"29000000000"}]"#;

    const LORE_BODY: &str = r#"{"data":[{"id":"90","symbol":"BTC","name":"Bitcoin","rank":1,
        "price_usd":"65000","percent_change_24h":"1.2","market_cap_usd":"1280000000000",
        "volume24":29000000000}]}"#;

    struct Harness {
        transport: Arc<ScriptedTransport>,
        clock: Arc<ManualClock>,
        orchestrator: FetchOrchestrator,
    }

    fn harness() -> Harness {
        let transport = Arc::new(ScriptedTransport::new());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()));
        // Direct calls only, so each source attempt is one transport call
        let config = FeedConfig {
            relays: Vec::new(),
            ..FeedConfig::default()
        };
        let orchestrator =
            FetchOrchestrator::with_parts(default_sources(), transport.clone(), clock.clone(), config);

        Harness {
            transport,
            clock,
            orchestrator,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_cache_served_without_network() {
        let mut h = harness();
        h.transport.respond(COINGECKO_URL, 200, GECKO_BODY);

        let first = h.orchestrator.fetch_coins(false).await;
        assert_eq!(first.source_id(), Some("coingecko"));
        assert!(!first.from_cache);
        assert_eq!(h.transport.calls().len(), 1);

        h.clock.advance(Duration::from_secs(30));
        let second = h.orchestrator.fetch_coins(false).await;

        assert!(second.from_cache);
        assert_eq!(second.coins, first.coins);
        assert!(second.attempts.is_empty());
        assert_eq!(h.transport.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_cache_refetches() {
        let mut h = harness();
        h.transport.respond(COINGECKO_URL, 200, GECKO_BODY);

        h.orchestrator.fetch_coins(false).await;
        h.clock.advance(Duration::from_secs(60));
        let outcome = h.orchestrator.fetch_coins(false).await;

        assert!(!outcome.from_cache);
        assert_eq!(h.transport.calls_to(COINGECKO_URL), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forced_refresh_ignores_fresh_cache() {
        let mut h = harness();
        h.transport.respond(COINGECKO_URL, 200, GECKO_BODY);

        h.orchestrator.fetch_coins(false).await;
        let outcome = h.orchestrator.fetch_coins(true).await;

        assert!(!outcome.from_cache);
        assert_eq!(h.transport.calls_to(COINGECKO_URL), 2);
        assert_eq!(h.orchestrator.health().passes(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_over_in_priority_order() {
        let mut h = harness();
        h.transport.respond(COINPAPRIKA_URL, 200, PAPRIKA_BODY);

        let outcome = h.orchestrator.fetch_coins(false).await;

        assert_eq!(outcome.source_id(), Some("coinpaprika"));
        assert_eq!(outcome.coins[0].id, "btc-bitcoin");
        assert_eq!(outcome.attempts.len(), 2);
        assert_eq!(outcome.attempts[0].source_id, "coingecko");
        assert!(matches!(outcome.attempts[0].result, AttemptResult::Failed(_)));
        assert_eq!(outcome.attempts[1].result, AttemptResult::Succeeded(1));

        // Two attempts on the primary, then the secondary answered
        assert_eq!(h.transport.calls_to(COINGECKO_URL), 2);
        assert_eq!(h.transport.calls_to(COINPAPRIKA_URL), 1);
        assert_eq!(h.transport.calls_to(COINLORE_URL), 0);
        assert_eq!(h.transport.calls_to(COINRANKING_URL), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_failure_reason_is_recorded() {
        let mut h = harness();
        h.transport.respond(COINGECKO_URL, 200, r#"{"status":"rate limited"}"#);
        h.transport.respond(COINPAPRIKA_URL, 200, PAPRIKA_BODY);

        let outcome = h.orchestrator.fetch_coins(false).await;

        match &outcome.attempts[0].result {
            AttemptResult::Failed(reason) => {
                assert!(reason.starts_with("Source unavailable: coingecko"));
                assert!(reason.contains("Parse error"));
            }
            other => panic!("unexpected attempt result: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_sources_down_returns_fallback() {
        let mut h = harness();

        let outcome = h.orchestrator.fetch_coins(true).await;

        assert!(outcome.is_fallback());
        assert_eq!(outcome.source_id(), None);
        assert_eq!(outcome.coins.len(), 5);
        assert_eq!(outcome.attempts.len(), 4);
        for url in [COINGECKO_URL, COINPAPRIKA_URL, COINLORE_URL, COINRANKING_URL] {
            assert_eq!(h.transport.calls_to(url), 2, "{}", url);
        }
        // Never succeeded, so the failed set is already cleared for next time
        assert!(h.orchestrator.health().failed().is_empty());

        let cached = h.orchestrator.fetch_coins(false).await;
        assert!(cached.from_cache);
        assert!(cached.is_fallback());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_sources_skipped_until_stale() {
        let mut h = harness();
        h.transport.respond(COINGECKO_URL, 200, GECKO_BODY);
        h.orchestrator.fetch_coins(true).await;

        h.transport.forget(COINGECKO_URL);
        h.clock.advance(Duration::from_secs(61));
        let outcome = h.orchestrator.fetch_coins(true).await;
        assert!(outcome.is_fallback());
        assert_eq!(
            h.orchestrator.health().failed(),
            vec!["coingecko", "coinlore", "coinpaprika", "coinranking"]
        );

        h.transport.clear_calls();
        h.clock.advance(Duration::from_secs(60));
        let outcome = h.orchestrator.fetch_coins(true).await;
        assert!(outcome.is_fallback());
        assert!(outcome
            .attempts
            .iter()
            .all(|a| a.result == AttemptResult::Skipped));
        assert!(h.transport.calls().is_empty());

        // 321s since the last success: everything is tried again
        h.transport.respond(COINGECKO_URL, 200, GECKO_BODY);
        h.clock.advance(Duration::from_secs(200));
        let outcome = h.orchestrator.fetch_coins(true).await;
        assert_eq!(outcome.source_id(), Some("coingecko"));
        assert!(h.orchestrator.health().failed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_secondary_success_keeps_primary_marked() {
        let mut h = harness();
        h.transport.respond(COINPAPRIKA_URL, 200, PAPRIKA_BODY);

        h.orchestrator.fetch_coins(true).await;
        assert_eq!(h.orchestrator.health().failed(), vec!["coingecko"]);
        assert_eq!(h.orchestrator.health().last_success(), Some(h.clock.now()));

        // Forced, yet the primary is skipped
        h.clock.advance(Duration::from_secs(120));
        let outcome = h.orchestrator.fetch_coins(true).await;
        assert_eq!(outcome.attempts[0].result, AttemptResult::Skipped);
        assert_eq!(outcome.source_id(), Some("coinpaprika"));
        assert_eq!(h.transport.calls_to(COINGECKO_URL), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_primary_retried_after_reset_window() {
        let mut h = harness();
        h.transport.respond(COINPAPRIKA_URL, 200, PAPRIKA_BODY);
        h.orchestrator.fetch_coins(true).await;

        // Secondary keeps succeeding, so only the per-source window lets the primary back in
        h.transport.respond(COINGECKO_URL, 200, GECKO_BODY);
        h.clock.advance(Duration::from_secs(301));
        let outcome = h.orchestrator.fetch_coins(true).await;

        assert_eq!(outcome.source_id(), Some("coingecko"));
        assert!(h.orchestrator.health().failed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_primary_success_clears_failed_set() {
        let mut h = harness();
        h.transport.respond(COINPAPRIKA_URL, 200, PAPRIKA_BODY);
        h.orchestrator.fetch_coins(true).await;

        h.transport.forget(COINPAPRIKA_URL);
        h.transport.respond(COINLORE_URL, 200, LORE_BODY);
        h.clock.advance(Duration::from_secs(200));
        h.orchestrator.fetch_coins(true).await;
        assert_eq!(h.orchestrator.health().failed(), vec!["coingecko", "coinpaprika"]);

        // Only the primary's window has run out, its success clears the rest
        h.transport.respond(COINGECKO_URL, 200, GECKO_BODY);
        h.clock.advance(Duration::from_secs(101));
        let outcome = h.orchestrator.fetch_coins(true).await;
        assert_eq!(outcome.source_id(), Some("coingecko"));
        assert!(h.orchestrator.health().failed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hits_are_not_passes() {
        let mut h = harness();
        h.transport.respond(COINGECKO_URL, 200, GECKO_BODY);

        h.orchestrator.fetch_coins(false).await;
        h.orchestrator.fetch_coins(false).await;
        h.orchestrator.fetch_coins(false).await;

        assert_eq!(h.orchestrator.health().passes(), 1);
    }

    #[test]
    fn test_disabled_sources_left_out() {
        let config = FeedConfig {
            disabled_sources: vec!["coinranking".to_string()],
            ..FeedConfig::default()
        };
        let orchestrator = FetchOrchestrator::new(config);
        assert_eq!(
            orchestrator.source_ids(),
            vec!["coingecko", "coinpaprika", "coinlore"]
        );
    }
}
