use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use shared::Coin;

use super::fields::{identifier, non_negative, rank, signed, text, Numeric};
use super::{finish, icon_url, CoinSource};
use crate::error::FeedError;

pub const COINLORE_URL: &str = "https://api.coinlore.net/api/tickers/?limit=20";

const ID: &str = "coinlore";

pub struct CoinLoreSource {
    endpoint: String,
}

impl Default for CoinLoreSource {
    fn default() -> Self {
        Self::new(COINLORE_URL)
    }
}

impl CoinLoreSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TickerPage {
    data: Vec<Ticker>,
}

// Prices arrive as strings, volume as a number, ids as either
#[derive(Debug, Deserialize)]
struct Ticker {
    id: Option<Value>,
    symbol: Option<String>,
    name: Option<String>,
    rank: Option<Numeric>,
    price_usd: Option<Numeric>,
    market_cap_usd: Option<Numeric>,
    percent_change_24h: Option<Numeric>,
    volume24: Option<Numeric>,
}

impl Ticker {
    fn into_coin(self) -> Result<Coin, FeedError> {
        let symbol = text(ID, "symbol", self.symbol)?.to_lowercase();

        Ok(Coin {
            id: identifier(ID, "id", self.id)?,
            name: text(ID, "name", self.name)?,
            image: icon_url(&symbol),
            current_price: non_negative(ID, "price_usd", self.price_usd.as_ref())?,
            market_cap: non_negative(ID, "market_cap_usd", self.market_cap_usd.as_ref())?,
            market_cap_rank: rank(ID, "rank", self.rank.as_ref())?,
            price_change_percentage_24h: signed(ID, "percent_change_24h", self.percent_change_24h.as_ref())?,
            total_volume: non_negative(ID, "volume24", self.volume24.as_ref())?,
            symbol,
        })
    }
}

#[async_trait]
impl CoinSource for CoinLoreSource {
    fn id(&self) -> &'static str {
        ID
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn normalize(&self, body: &str) -> Result<Vec<Coin>, FeedError> {
        let page: TickerPage =
            serde_json::from_str(body).map_err(|e| FeedError::parse(ID, e.to_string()))?;

        let coins = page
            .data
            .into_iter()
            .map(Ticker::into_coin)
            .collect::<Result<Vec<_>, _>>()?;

        finish(ID, coins)
    }
}
