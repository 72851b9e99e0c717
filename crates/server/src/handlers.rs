use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::Utc;
use log::{info, warn};
use shared::{parse_sort_key, parse_sort_order, SortKey, SortOrder};

use crate::dashboard::{RefreshResult, NOTICE_BUSY};
use crate::types::{AppState, CoinsQuery, ErrorResponse};

#[get("/api/coins")]
pub async fn get_coins(query: web::Query<CoinsQuery>, data: web::Data<AppState>) -> impl Responder {
    let search = query.q.as_deref().unwrap_or("");
    let key = query
        .sort
        .as_deref()
        .and_then(|s| {
            let key = parse_sort_key(s);
            if key.is_none() {
                warn!("Unknown sort key '{}', using rank", s);
            }
            key
        })
        .unwrap_or_default();
    let order = query.order.as_deref().map(parse_sort_order).unwrap_or_default();

    web::Json(data.dashboard.response(search, key, order))
}

#[post("/api/coins/refresh")]
pub async fn refresh_coins(data: web::Data<AppState>) -> impl Responder {
    info!("Manual refresh triggered");

    match data.dashboard.refresh(true).await {
        RefreshResult::Busy => HttpResponse::Conflict().json(ErrorResponse {
            error: NOTICE_BUSY.to_string(),
        }),
        RefreshResult::Completed(_) | RefreshResult::TimedOut | RefreshResult::Failed => {
            HttpResponse::Ok().json(data.dashboard.response("", SortKey::Rank, SortOrder::Asc))
        }
    }
}

#[get("/health")]
pub async fn health_check() -> impl Responder {
    web::Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now()
    }))
}
