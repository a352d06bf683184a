use std::time::Duration;

use anyhow::Result;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use restaurant_orderservice::{
    app,
    common::{
        app_state::AppState,
        bootstrap::{self, bootstrap},
        config::{self, StorageBackend},
        db,
    },
    store::Store,
};

/// Migrations embedded into the binary so images need no SQL files at runtime
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_tracing();
    bootstrap::init_env();

    let config = config::load()?;

    let store = match config.storage {
        StorageBackend::Postgres => {
            tracing::info!("Running migrations...");
            let migrations_count =
                db::run_migrations_blocking(MIGRATIONS, &config.database.url).await?;
            tracing::info!("Run {} new migrations successfully", migrations_count);

            let pool = db::create_pool(&config.database.url, config.database.max_connections).await?;
            Store::postgres(pool)
        }
        StorageBackend::Memory => {
            if config.is_production() {
                anyhow::bail!("STORAGE=memory is not allowed when APP_ENV=production");
            }
            tracing::warn!("Using the in-memory store, data is lost on shutdown");
            Store::in_memory()
        }
    };

    let state = AppState::new(store, &config);
    let app = app(state)?;

    tracing::info!("Bootstrapping...");
    bootstrap(
        "OrderService",
        app,
        config.server.port,
        Duration::from_secs(config.server.request_timeout_secs),
    )
    .await?;
    Ok(())
}
