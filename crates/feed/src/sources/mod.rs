//! Source adapters, one per upstream price API.
//!
//! Every adapter knows its endpoint and how to turn that API's payload into
//! the canonical [`Coin`] rows. Fetching goes through the shared
//! [`ProxyRelay`], so adapters never touch the transport directly.

mod fields;

pub mod coingecko;
pub mod coinlore;
pub mod coinpaprika;
pub mod coinranking;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use shared::Coin;

use crate::error::FeedError;
use crate::relay::ProxyRelay;

pub use coingecko::CoinGeckoSource;
pub use coinlore::CoinLoreSource;
pub use coinpaprika::CoinPaprikaSource;
pub use coinranking::CoinRankingSource;

/// Every endpoint asks for the top 20; longer payloads are cut to this.
pub const COIN_LIMIT: usize = 20;

/// Icon service for upstreams that do not ship an image URL.
pub(crate) fn icon_url(symbol: &str) -> String {
    format!("https://coinicons-api.vercel.app/api/icon/{}", symbol.to_lowercase())
}

#[async_trait]
pub trait CoinSource: Send + Sync {
    /// Stable identifier used in logs and in the failed-source set.
    fn id(&self) -> &'static str;

    fn endpoint(&self) -> &str;

    /// Parses a response body into rows ordered by ascending rank.
    fn normalize(&self, body: &str) -> Result<Vec<Coin>, FeedError>;

    /// Fetches the raw body through the relay chain.
    async fn fetch_raw(&self, relay: &ProxyRelay) -> Result<String, FeedError> {
        let response = relay.relay(self.endpoint()).await?;
        Ok(response.body)
    }

    /// One complete attempt: fetch then normalize.
    async fn fetch(&self, relay: &ProxyRelay) -> Result<Vec<Coin>, FeedError> {
        let body = self.fetch_raw(relay).await?;
        self.normalize(&body)
    }
}

/// All four adapters in priority order.
pub fn default_sources() -> Vec<Arc<dyn CoinSource>> {
    vec![
        Arc::new(CoinGeckoSource::default()),
        Arc::new(CoinPaprikaSource::default()),
        Arc::new(CoinLoreSource::default()),
        Arc::new(CoinRankingSource::default()),
    ]
}

/// Orders by rank, applies the cap and rejects duplicate ranks.
pub(crate) fn finish(source: &str, mut coins: Vec<Coin>) -> Result<Vec<Coin>, FeedError> {
    if coins.is_empty() {
        return Err(FeedError::parse(source, "payload contained no coins"));
    }

    coins.sort_by_key(|c| c.market_cap_rank);
    coins.truncate(COIN_LIMIT);

    let mut seen = HashSet::new();
    for coin in &coins {
        if !seen.insert(coin.market_cap_rank) {
            return Err(FeedError::parse(
                source,
                format!("duplicate rank {} ({})", coin.market_cap_rank, coin.id),
            ));
        }
    }

    Ok(coins)
}
