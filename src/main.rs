mod chat;
mod config;
mod db;
mod error;
mod gateway;
mod models;
mod routes;
mod services;
mod state;
mod store;

use std::sync::Arc;

use chat::responses::ResponseTable;
use config::{AppConfig, StoreBackend};
use gateway::CrudGateway;
use gateway::cache::QueryCache;
use store::Store;
use store::memory::MemoryStore;
use store::postgres::PgStore;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env().expect("invalid configuration");

    let store: Arc<dyn Store> = match &config.store {
        StoreBackend::Postgres { database_url, max_connections } => {
            let pool = db::init_pool(database_url, *max_connections)
                .await
                .expect("database init failed");
            tracing::info!(max_connections, "postgres store ready");
            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let responses = match &config.chat.responses_path {
        Some(path) => ResponseTable::load(path).expect("response table load failed"),
        None => ResponseTable::builtin().expect("built-in response table invalid"),
    };
    tracing::info!(rules = responses.rules.len(), "response table loaded");

    let gateway = CrudGateway::new(store, QueryCache::new(config.query_cache));
    let state = state::AppState::new(gateway, responses, config.chat.clone());

    // Spawn background session sweeper.
    let _sweeper = services::chat::spawn_session_sweeper(state.clone());

    let app = routes::app(state);
    let port = config.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "studio assistant listening");
    axum::serve(listener, app).await.expect("server failed");
}
