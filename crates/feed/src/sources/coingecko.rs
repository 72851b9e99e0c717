use async_trait::async_trait;
use serde::Deserialize;
use shared::Coin;

use super::fields::{non_negative, rank, signed, text, Numeric};
use super::{finish, CoinSource};
use crate::error::FeedError;

pub const COINGECKO_URL: &str = "https://api.coingecko.com/api/v3/coins/markets?vs_currency=usd&order=market_cap_desc&per_page=20&page=1&sparkline=false&price_change_percentage=24h";

const ID: &str = "coingecko";

/// Primary aggregator. Its payload already uses the canonical field names.
pub struct CoinGeckoSource {
    endpoint: String,
}

impl Default for CoinGeckoSource {
    fn default() -> Self {
        Self::new(COINGECKO_URL)
    }
}

impl CoinGeckoSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MarketEntry {
    id: Option<String>,
    symbol: Option<String>,
    name: Option<String>,
    image: Option<String>,
    current_price: Option<Numeric>,
    market_cap: Option<Numeric>,
    market_cap_rank: Option<Numeric>,
    price_change_percentage_24h: Option<Numeric>,
    total_volume: Option<Numeric>,
}

impl MarketEntry {
    fn into_coin(self) -> Result<Coin, FeedError> {
        Ok(Coin {
            current_price: non_negative(ID, "current_price", self.current_price.as_ref())?,
            market_cap: non_negative(ID, "market_cap", self.market_cap.as_ref())?,
            market_cap_rank: rank(ID, "market_cap_rank", self.market_cap_rank.as_ref())?,
            price_change_percentage_24h: signed(
                ID,
                "price_change_percentage_24h",
                self.price_change_percentage_24h.as_ref(),
            )?,
            total_volume: non_negative(ID, "total_volume", self.total_volume.as_ref())?,
            id: text(ID, "id", self.id)?,
            symbol: text(ID, "symbol", self.symbol)?.to_lowercase(),
            name: text(ID, "name", self.name)?,
            image: text(ID, "image", self.image)?,
        })
    }
}

#[async_trait]
impl CoinSource for CoinGeckoSource {
    fn id(&self) -> &'static str {
        ID
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn normalize(&self, body: &str) -> Result<Vec<Coin>, FeedError> {
        let entries: Vec<MarketEntry> =
            serde_json::from_str(body).map_err(|e| FeedError::parse(ID, e.to_string()))?;

        let coins = entries
            .into_iter()
            .map(MarketEntry::into_coin)
            .collect::<Result<Vec<_>, _>>()?;

        finish(ID, coins)
    }
}
