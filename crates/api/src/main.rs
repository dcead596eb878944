use std::net::SocketAddr;
use std::sync::Arc;

use arcus_api::config::ServerConfig;
use arcus_api::router::build_app_router;
use arcus_api::state::AppState;
use arcus_backend::HttpBackend;
use arcus_lifecycle::JobLifecycleController;
use arcus_registry::memory::InMemoryRegistry;
use arcus_registry::{postgres, JobRegistry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arcus_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Job registry ---
    let registry: Arc<dyn JobRegistry> = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = postgres::create_pool(&database_url).await?;
            postgres::health_check(&pool).await?;
            postgres::run_migrations(&pool).await?;
            tracing::info!("Using Postgres job registry");
            Arc::new(postgres::PgJobRegistry::new(pool))
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using in-memory job registry");
            Arc::new(InMemoryRegistry::new())
        }
    };

    // --- Compute backend ---
    let backend = Arc::new(HttpBackend::new(config.backend_api_url.clone()));
    tracing::info!(backend_api_url = %config.backend_api_url, "Compute backend configured");

    // --- Lifecycle controller ---
    let controller = Arc::new(JobLifecycleController::new(
        registry,
        backend,
        config.lifecycle_config(),
    ));

    let state = AppState {
        controller,
        config: Arc::new(config.clone()),
    };
    let app = build_app_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
