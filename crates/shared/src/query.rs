use serde::{Deserialize, Serialize};

use crate::types::Coin;

/// Column the market table can be sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Rank,
    Name,
    Price,
    Change24h,
    MarketCap,
    Volume,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Case-insensitive substring match on name or symbol. An empty query matches everything.
pub fn matches_query(coin: &Coin, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    coin.name.to_lowercase().contains(&query) || coin.symbol.to_lowercase().contains(&query)
}

pub fn filter_coins(coins: &[Coin], query: &str) -> Vec<Coin> {
    coins
        .iter()
        .filter(|coin| matches_query(coin, query))
        .cloned()
        .collect()
}

pub fn sort_coins(coins: &mut [Coin], key: SortKey, order: SortOrder) {
    coins.sort_by(|a, b| {
        let ordering = match key {
            SortKey::Rank => a.market_cap_rank.cmp(&b.market_cap_rank),
            SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortKey::Price => a.current_price.total_cmp(&b.current_price),
            SortKey::Change24h => a
                .price_change_percentage_24h
                .total_cmp(&b.price_change_percentage_24h),
            SortKey::MarketCap => a.market_cap.total_cmp(&b.market_cap),
            SortKey::Volume => a.total_volume.total_cmp(&b.total_volume),
        };
        // Rank breaks ties so equal values keep a stable table order
        let ordering = ordering.then_with(|| a.market_cap_rank.cmp(&b.market_cap_rank));
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

/// Parses the `order` query value; anything other than `desc` sorts ascending.
pub fn parse_sort_order(value: &str) -> SortOrder {
    if value.eq_ignore_ascii_case("desc") {
        SortOrder::Desc
    } else {
        SortOrder::Asc
    }
}

pub fn parse_sort_key(value: &str) -> Option<SortKey> {
    match value.to_lowercase().as_str() {
        "rank" | "market_cap_rank" => Some(SortKey::Rank),
        "name" => Some(SortKey::Name),
        "price" | "current_price" => Some(SortKey::Price),
        "change_24h" | "change" | "price_change_percentage_24h" => Some(SortKey::Change24h),
        "market_cap" => Some(SortKey::MarketCap),
        "volume" | "total_volume" => Some(SortKey::Volume),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(id: &str, symbol: &str, name: &str, rank: u32, price: f64, change: f64) -> Coin {
        Coin {
            id: id.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            image: String::new(),
            current_price: price,
            market_cap: price * 1_000_000.0,
            market_cap_rank: rank,
            price_change_percentage_24h: change,
            total_volume: 1000.0 * rank as f64,
        }
    }

    fn sample() -> Vec<Coin> {
        vec![
            coin("bitcoin", "btc", "Bitcoin", 1, 65000.0, 2.0),
            coin("ethereum", "eth", "Ethereum", 2, 3400.0, -1.5),
            coin("tether", "usdt", "Tether", 3, 1.0, 0.01),
        ]
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert_eq!(filter_coins(&sample(), "").len(), 3);
        assert_eq!(filter_coins(&sample(), "   ").len(), 3);
    }

    #[test]
    fn test_query_matches_name_or_symbol_case_insensitive() {
        let by_name = filter_coins(&sample(), "ETHER");
        assert_eq!(by_name.len(), 2); // Ethereum and Tether

        let by_symbol = filter_coins(&sample(), "usd");
        assert_eq!(by_symbol.len(), 1);
        assert_eq!(by_symbol[0].id, "tether");

        assert!(filter_coins(&sample(), "doge").is_empty());
    }

    #[test]
    fn test_sort_by_price_desc() {
        let mut coins = sample();
        sort_coins(&mut coins, SortKey::Price, SortOrder::Desc);
        let ids: Vec<_> = coins.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["bitcoin", "ethereum", "tether"]);
    }

    #[test]
    fn test_sort_by_change_asc() {
        let mut coins = sample();
        sort_coins(&mut coins, SortKey::Change24h, SortOrder::Asc);
        assert_eq!(coins[0].id, "ethereum");
        assert_eq!(coins[2].id, "bitcoin");
    }

    #[test]
    fn test_sort_by_rank_restores_table_order() {
        let mut coins = sample();
        coins.reverse();
        sort_coins(&mut coins, SortKey::Rank, SortOrder::Asc);
        let ranks: Vec<_> = coins.iter().map(|c| c.market_cap_rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_parse_sort_params() {
        assert_eq!(parse_sort_key("price"), Some(SortKey::Price));
        assert_eq!(parse_sort_key("MARKET_CAP"), Some(SortKey::MarketCap));
        assert_eq!(parse_sort_key("bogus"), None);
        assert_eq!(parse_sort_order("DESC"), SortOrder::Desc);
        assert_eq!(parse_sort_order("anything"), SortOrder::Asc);
    }
}
