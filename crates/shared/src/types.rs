use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Shared data structures used by the fetch core and the server

/// One row of the market table, normalized from whichever upstream produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: String,
    pub current_price: f64,
    pub market_cap: f64,
    pub market_cap_rank: u32,
    pub price_change_percentage_24h: f64,
    pub total_volume: f64,
}

/// What kind of data the dashboard is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataStatus {
    /// Nothing has been loaded yet.
    Empty,
    /// Live data from one of the upstream sources.
    Live,
    /// Previously loaded data kept after a refresh failed or overran its deadline.
    Stale,
    /// Synthetic sample data.
    Fallback,
}

impl DataStatus {
    pub fn is_fallback(&self) -> bool {
        matches!(self, DataStatus::Fallback)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinsResponse {
    pub data: Vec<Coin>,
    pub last_updated: Option<DateTime<Utc>>,
    pub status: DataStatus,
    pub is_fallback: bool,
    pub is_loading: bool,
    /// Set once more than three refreshes in a row have failed.
    pub has_error: bool,
    pub error_count: u32,
    pub consecutive_errors: u32,
    pub source: Option<String>,
    pub notice: Option<String>,
}
