use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use ogenki_api::config::{Config, StoreBackend};
use ogenki_api::services::check_in::CheckInService;
use ogenki_api::store::{CheckInStore, MemoryCheckInStore, PgCheckInStore};
use ogenki_api::{build_router, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Arc::new(Config::from_env().context("Failed to load configuration")?);

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ogenki_api=debug,tower_http=debug".into());
    if config.is_production() {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let store: Arc<dyn CheckInStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = db::create_pool(&config.database)
                .await
                .context("Failed to connect to database")?;

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;

            tracing::info!(
                database = %config.database.display_target(),
                "Database connected and migrations applied"
            );
            Arc::new(PgCheckInStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!(
                "Using in-memory check-in store; data is lost on restart and \"today\" \
                 is the UTC day regardless of DB_TIMEZONE"
            );
            Arc::new(MemoryCheckInStore::new())
        }
    };

    let state = AppState {
        check_ins: CheckInService::new(store, config.history_max_limit),
        config: config.clone(),
    };

    let app = build_router(state);

    let addr = config.listen_addr();
    tracing::info!(addr = %addr, env = %config.env, "Starting server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
