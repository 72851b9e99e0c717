use async_trait::async_trait;
use serde::Deserialize;
use shared::Coin;

use super::fields::{non_negative, signed, text, Numeric};
use super::{finish, icon_url, CoinSource};
use crate::error::FeedError;

pub const COINPAPRIKA_URL: &str = "https://api.coinpaprika.com/v1/tickers?limit=20";

const ID: &str = "coinpaprika";

/// Secondary ticker service. It has no usable rank, so rows are ranked by
/// their position in the response.
pub struct CoinPaprikaSource {
    endpoint: String,
}

impl Default for CoinPaprikaSource {
    fn default() -> Self {
        Self::new(COINPAPRIKA_URL)
    }
}

impl CoinPaprikaSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Ticker {
    id: Option<String>,
    symbol: Option<String>,
    name: Option<String>,
    price_usd: Option<Numeric>,
    market_cap_usd: Option<Numeric>,
    percent_change_24h: Option<Numeric>,
    volume_24h_usd: Option<Numeric>,
    quotes: Option<Quotes>,
}

// Newer payloads nest the USD figures instead of flattening them
#[derive(Debug, Deserialize)]
struct Quotes {
    #[serde(rename = "USD")]
    usd: Option<UsdQuote>,
}

#[derive(Debug, Deserialize)]
struct UsdQuote {
    price: Option<Numeric>,
    market_cap: Option<Numeric>,
    percent_change_24h: Option<Numeric>,
    volume_24h: Option<Numeric>,
}

impl Ticker {
    fn into_coin(self, position: usize) -> Result<Coin, FeedError> {
        let usd = self.quotes.and_then(|q| q.usd);
        let nested = |pick: fn(&UsdQuote) -> Option<&Numeric>| usd.as_ref().and_then(pick);

        let price = self.price_usd.as_ref().or_else(|| nested(|q| q.price.as_ref()));
        let market_cap = self
            .market_cap_usd
            .as_ref()
            .or_else(|| nested(|q| q.market_cap.as_ref()));
        let change = self
            .percent_change_24h
            .as_ref()
            .or_else(|| nested(|q| q.percent_change_24h.as_ref()));
        let volume = self
            .volume_24h_usd
            .as_ref()
            .or_else(|| nested(|q| q.volume_24h.as_ref()));

        let symbol = text(ID, "symbol", self.symbol)?.to_lowercase();

        Ok(Coin {
            id: text(ID, "id", self.id)?,
            name: text(ID, "name", self.name)?,
            image: icon_url(&symbol),
            current_price: non_negative(ID, "price_usd", price)?,
            market_cap: non_negative(ID, "market_cap_usd", market_cap)?,
            market_cap_rank: position as u32 + 1,
            price_change_percentage_24h: signed(ID, "percent_change_24h", change)?,
            total_volume: non_negative(ID, "volume_24h_usd", volume)?,
            symbol,
        })
    }
}

#[async_trait]
impl CoinSource for CoinPaprikaSource {
    fn id(&self) -> &'static str {
        ID
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn normalize(&self, body: &str) -> Result<Vec<Coin>, FeedError> {
        let tickers: Vec<Ticker> =
            serde_json::from_str(body).map_err(|e| FeedError::parse(ID, e.to_string()))?;

        let coins = tickers
            .into_iter()
            .enumerate()
            .map(|(position, ticker)| ticker.into_coin(position))
            .collect::<Result<Vec<_>, _>>()?;

        finish(ID, coins)
    }
}
