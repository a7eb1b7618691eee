use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use hamere_hiwot::{api, config, db, metrics};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hamere_hiwot=info".parse()?)
        )
        .init();

    info!("Starting Hamere Hiwot admin v{}", env!("CARGO_PKG_VERSION"));

    let cfg = config::load()?;
    info!("Configuration loaded");

    let db_pool = db::init(&cfg).await?;
    info!("Database initialized");

    db::seed::seed_reference_data(&db_pool).await?;

    // Seed initial admin user if none exist
    db::seed_admin(&db_pool, &cfg).await?;

    if cfg.database.seed_demo_data {
        db::seed::seed_demo_data(&db_pool).await?;
    }

    let metrics = Arc::new(metrics::AccessMetrics::default());

    api::serve(cfg, db_pool, metrics).await
}
