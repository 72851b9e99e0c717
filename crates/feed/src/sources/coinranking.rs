use async_trait::async_trait;
use serde::Deserialize;
use shared::Coin;

use super::fields::{non_negative, rank, signed, text, Numeric};
use super::{finish, CoinSource};
use crate::error::FeedError;

pub const COINRANKING_URL: &str = "https://api.coinranking.com/v2/coins?limit=20";

const ID: &str = "coinranking";

/// Last resort. Volume is optional here and defaults to zero when the
/// field is absent.
pub struct CoinRankingSource {
    endpoint: String,
}

impl Default for CoinRankingSource {
    fn default() -> Self {
        Self::new(COINRANKING_URL)
    }
}

impl CoinRankingSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    data: CoinList,
}

#[derive(Debug, Deserialize)]
struct CoinList {
    coins: Vec<RankedCoin>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RankedCoin {
    uuid: Option<String>,
    symbol: Option<String>,
    name: Option<String>,
    icon_url: Option<String>,
    price: Option<Numeric>,
    market_cap: Option<Numeric>,
    rank: Option<Numeric>,
    change: Option<Numeric>,
    #[serde(rename = "24hVolume")]
    volume_24h: Option<Numeric>,
    volume: Option<Numeric>,
}

impl RankedCoin {
    fn into_coin(self) -> Result<Coin, FeedError> {
        let total_volume = match self.volume_24h.as_ref().or(self.volume.as_ref()) {
            Some(raw) => non_negative(ID, "24hVolume", Some(raw))?,
            None => 0.0,
        };

        Ok(Coin {
            id: text(ID, "uuid", self.uuid)?,
            symbol: text(ID, "symbol", self.symbol)?.to_lowercase(),
            name: text(ID, "name", self.name)?,
            image: text(ID, "iconUrl", self.icon_url)?,
            current_price: non_negative(ID, "price", self.price.as_ref())?,
            market_cap: non_negative(ID, "marketCap", self.market_cap.as_ref())?,
            market_cap_rank: rank(ID, "rank", self.rank.as_ref())?,
            price_change_percentage_24h: signed(ID, "change", self.change.as_ref())?,
            total_volume,
        })
    }
}

#[async_trait]
impl CoinSource for CoinRankingSource {
    fn id(&self) -> &'static str {
        ID
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn normalize(&self, body: &str) -> Result<Vec<Coin>, FeedError> {
        let envelope: Envelope =
            serde_json::from_str(body).map_err(|e| FeedError::parse(ID, e.to_string()))?;

        let coins = envelope
            .data
            .coins
            .into_iter()
            .map(RankedCoin::into_coin)
            .collect::<Result<Vec<_>, _>>()?;

        finish(ID, coins)
    }
}
