use actix_web::{web, App, HttpServer};
use std::io;
use std::sync::Arc;
use tokio::signal;

mod api_error;
mod config;
mod db;
mod http;
mod middleware;
mod models;
mod service;
mod session;
mod store;
mod telemetry;

use crate::config::Config;
use crate::db::create_pool;
use crate::http::{configure_routes, AppState};
use crate::middleware::cors_middleware;
use crate::service::{MatchNotifier, NoopNotifier, PlayerNotifier, WebhookNotifier};
use crate::store::PgStore;
use crate::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> io::Result<()> {
    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    init_telemetry(&config.server.rust_log);

    let db_pool = create_pool(&config)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::ConnectionRefused, e.to_string()))?;
    let store = Arc::new(PgStore::new(db_pool));

    let webhooks = WebhookNotifier::new(&config.notifications);
    let (notifier, player_notifier): (Arc<dyn MatchNotifier>, Arc<dyn PlayerNotifier>) =
        if webhooks.is_configured() {
            let webhooks = Arc::new(webhooks);
            (webhooks.clone(), webhooks)
        } else {
            tracing::info!("No notification webhooks configured");
            (Arc::new(NoopNotifier), Arc::new(NoopNotifier))
        };

    let state = web::Data::new(AppState::new(
        store,
        notifier,
        player_notifier,
        &config.avatar.base_url,
        config.league.team_balance_filter,
    ));

    tracing::info!(
        "Starting league backend on {}:{}",
        config.server.host,
        config.server.port
    );

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors_middleware())
            .wrap(actix_web::middleware::Logger::default())
            .configure(configure_routes::<PgStore>)
    })
    .bind((config.server.host.clone(), config.server.port))?
    .run();

    // Graceful shutdown
    let server_handle = server.handle();
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        tracing::info!("Shutdown signal received, stopping server...");
        server_handle.stop(true).await;
    });

    server.await
}
