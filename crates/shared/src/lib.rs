// Shared data structures and helpers used by both the fetch core and the server

pub mod logging;
pub mod query;
pub mod types;

pub use logging::{init_logging, level_filter};
pub use query::{filter_coins, matches_query, parse_sort_key, parse_sort_order, sort_coins, SortKey, SortOrder};
pub use types::{Coin, CoinsResponse, DataStatus};
