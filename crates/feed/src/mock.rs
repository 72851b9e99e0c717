//! Synthetic market data, used when every source is down.

use chrono::{DateTime, Timelike, Utc};
use shared::Coin;

struct ReferenceAsset {
    id: &'static str,
    symbol: &'static str,
    name: &'static str,
    image: &'static str,
    base_price: f64,
    market_cap: f64,
    rank: u32,
    base_change: f64,
    volume: f64,
}

const REFERENCE_ASSETS: [ReferenceAsset; 5] = [
    ReferenceAsset {
        id: "bitcoin",
        symbol: "btc",
        name: "Bitcoin",
        image: "https://assets.coingecko.com/coins/images/1/large/bitcoin.png",
        base_price: 65432.12,
        market_cap: 1_278_654_321_098.0,
        rank: 1,
        base_change: 2.35,
        volume: 32_456_789_012.0,
    },
    ReferenceAsset {
        id: "ethereum",
        symbol: "eth",
        name: "Ethereum",
        image: "https://assets.coingecko.com/coins/images/279/large/ethereum.png",
        base_price: 3456.78,
        market_cap: 415_678_901_234.0,
        rank: 2,
        base_change: -1.23,
        volume: 18_765_432_109.0,
    },
    ReferenceAsset {
        id: "tether",
        symbol: "usdt",
        name: "Tether",
        image: "https://assets.coingecko.com/coins/images/325/large/Tether.png",
        base_price: 1.0,
        market_cap: 98_765_432_100.0,
        rank: 3,
        base_change: 0.01,
        volume: 65_432_109_876.0,
    },
    ReferenceAsset {
        id: "binancecoin",
        symbol: "bnb",
        name: "BNB",
        image: "https://assets.coingecko.com/coins/images/825/large/bnb-icon2_2x.png",
        base_price: 567.89,
        market_cap: 87_654_321_098.0,
        rank: 4,
        base_change: 1.45,
        volume: 2_345_678_901.0,
    },
    ReferenceAsset {
        id: "solana",
        symbol: "sol",
        name: "Solana",
        image: "https://assets.coingecko.com/coins/images/4128/large/solana.png",
        base_price: 123.45,
        market_cap: 54_321_098_765.0,
        rank: 5,
        base_change: 5.67,
        volume: 3_456_789_012.0,
    },
];

// Stable-value asset moves ten times less than the others
const STABLE_ID: &str = "tether";

/// `hour * 60 + minute` in UTC.
pub fn minute_of_day(at: DateTime<Utc>) -> u32 {
    at.hour() * 60 + at.minute()
}

/// Five reference coins with a small deterministic wobble keyed on the minute.
///
/// Prices move within ±1% of their base (±0.1% for the stablecoin) and the
/// 24h change within ±15% of its base. Cap, rank and volume never move.
pub fn synthetic_coins(minute_of_day: u32) -> Vec<Coin> {
    let factor = f64::from(minute_of_day % 60) / 60.0;

    REFERENCE_ASSETS
        .iter()
        .map(|asset| {
            let spread = if asset.id == STABLE_ID { 0.001 } else { 0.01 };
            let price_variation = (factor - 0.5) * 2.0 * spread;
            let change_variation = (factor - 0.5) * 0.3;

            Coin {
                id: asset.id.to_string(),
                symbol: asset.symbol.to_string(),
                name: asset.name.to_string(),
                image: asset.image.to_string(),
                current_price: asset.base_price * (1.0 + price_variation),
                market_cap: asset.market_cap,
                market_cap_rank: asset.rank,
                price_change_percentage_24h: asset.base_change * (1.0 + change_variation),
                total_volume: asset.volume,
            }
        })
        .collect()
}
