// Server Main
// Wires configuration, the fetch orchestrator, the refresh task and the HTTP routes

use actix_web::{middleware::Logger, web, App, HttpServer};
use coin_board_feed::{FetchOrchestrator, ReqwestTransport};
use log::info;
use reqwest::Client;
use std::sync::Arc;

mod config;
mod dashboard;
mod data;
mod handlers;
mod types;

use config::ServerConfig;
use dashboard::Dashboard;
use data::refresh_data_periodically;
use handlers::{get_coins, health_check, refresh_coins};
use types::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = ServerConfig::load().map_err(|e| {
        eprintln!("Failed to load server configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e)
    })?;

    config.setup_logging();

    let client = Client::builder()
        .user_agent(concat!("coin-board/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let orchestrator =
        FetchOrchestrator::with_transport(Arc::new(ReqwestTransport::new(client)), config.feed.clone());
    info!("Source chain: {}", orchestrator.source_ids().join(" -> "));

    let dashboard = Arc::new(Dashboard::new(orchestrator, config.dashboard));

    tokio::spawn(refresh_data_periodically(dashboard.clone()));

    let state = web::Data::new(AppState { dashboard });

    info!("Starting coin board server on http://{}:{}", config.http_host, config.http_port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .service(get_coins)
            .service(refresh_coins)
            .service(health_check)
    })
    .bind((config.http_host.as_str(), config.http_port))?
    .run()
    .await
}
