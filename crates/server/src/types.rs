use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dashboard::Dashboard;

pub struct AppState {
    pub dashboard: Arc<Dashboard>,
}

/// Query string of `GET /api/coins`.
#[derive(Debug, Default, Deserialize)]
pub struct CoinsQuery {
    pub q: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
