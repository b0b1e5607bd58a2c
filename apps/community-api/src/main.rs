use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use community_api::config::Config;
use community_api::db::memory::MemoryStore;
use community_api::db::pg::PgStore;
use community_api::service::CommunityService;
use community_api::AppState;

#[tokio::main]
async fn main() {
    // A missing .env is fine; the variables may come from the environment.
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let port = config.port;

    let service = match config.database_url.as_deref() {
        Some(database_url) => {
            let db = match community_api::db::pool::connect(database_url, config.db_pool_size) {
                Ok(db) => db,
                Err(err) => {
                    tracing::error!(?err, "failed to build database pool");
                    std::process::exit(1);
                }
            };
            CommunityService::with_store(Arc::new(PgStore::new(db)), config.max_feed_limit)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store, data will not persist");
            CommunityService::with_store(Arc::new(MemoryStore::new()), config.max_feed_limit)
        }
    };

    tracing::info!(max_feed_limit = config.max_feed_limit, "community-api configured");

    let state = AppState { service };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(community_api::routes::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "community-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(?err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
