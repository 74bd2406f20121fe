//! lectern-api — HTTP API server for lectern.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lectern_api::{app, AppState};
use lectern_core::GenerationClient;
use lectern_db::object_store::{FsObjectStore, MemoryObjectStore, ObjectStore};
use lectern_db::Database;
use lectern_inference::OpenAiCompatClient;
use lectern_jobs::TokioDispatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new("info,lectern=debug")
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let db = Database::connect(&database_url).await?;
    db.migrate().await?;

    let objects: Arc<dyn ObjectStore> = match std::env::var("LECTERN_DATA_DIR") {
        Ok(dir) => {
            let store = FsObjectStore::new(&dir);
            store
                .validate()
                .await
                .map_err(|e| anyhow::anyhow!("object store validation failed: {}", e))?;
            info!(data_dir = %dir, "Using filesystem object store");
            Arc::new(store)
        }
        Err(_) => {
            warn!("LECTERN_DATA_DIR unset, using in-memory object store (dev only)");
            Arc::new(MemoryObjectStore::new())
        }
    };

    let client: Arc<dyn GenerationClient> = Arc::new(OpenAiCompatClient::from_env()?);
    let state = AppState::new(&db, objects, client, Arc::new(TokioDispatcher::new()));

    let addr: SocketAddr = std::env::var("LECTERN_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        .parse()
        .context("invalid LECTERN_ADDR")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "lectern-api listening");
    axum::serve(listener, app(state)).await?;

    Ok(())
}
