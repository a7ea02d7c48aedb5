use std::sync::Arc;

use anyhow::Result;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use storefront_orderservice::{
    core::{
        app_state::AppState,
        bootstrap::{self, bootstrap},
        config, db,
    },
    media::MediaGate,
    routes,
    store::PgStore,
};

/// Migrations embedded into the binary which helps with streamlining image building process
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_tracing();
    bootstrap::init_env();

    let config = config::load()?;

    tracing::info!("Running migrations...");
    let migrations_count = db::run_migrations_blocking(MIGRATIONS, &config.database.url).await?;
    tracing::info!("Run {} new migrations successfully", migrations_count);

    let pool = db::create_pool(&config.database.url).await?;
    let state = AppState {
        store: Arc::new(PgStore::new(pool)),
        media: MediaGate::new(&config.uploads.dir, &config.uploads.public_base_url),
        auth: config.auth.clone(),
        max_upload_bytes: config.uploads.max_bytes,
    };

    tracing::info!("Bootstrapping...");
    bootstrap("OrderService", routes::app(state), &config.server).await?;
    Ok(())
}
