// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use dotenv::dotenv;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use social_feed::api::{self, AppState};
use social_feed::auth::TrustedHeaderProvider;
use social_feed::config::{Config, StoreBackend};
use social_feed::db::init_database;
use social_feed::service::SocialService;
use social_feed::store::{MemoryStore, PgStore, SocialStore};

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,social_feed=debug"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, initiating graceful shutdown"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if present
    dotenv().ok();

    let config = Config::init()?;
    init_tracing(config.logging.json);
    info!("Initialized configuration");

    let store: Arc<dyn SocialStore> = match config.database.backend {
        StoreBackend::Postgres => {
            let db = Arc::new(init_database(&config.database).await?);
            info!("Connected to database");
            Arc::new(PgStore::new(db))
        }
        StoreBackend::Memory => {
            info!("Using in-memory store; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState {
        service: Arc::new(SocialService::new(store, config.feed.page_size)),
        identity: Arc::new(TrustedHeaderProvider::new(config.auth.header_prefix.clone())),
        max_limit: config.feed.max_limit,
    };

    if let Err(e) = api::start_api_server(state, &config.api, shutdown_signal()).await {
        error!("API server error: {}", e);
        return Err(e);
    }

    info!("Social feed shutdown complete");
    Ok(())
}
