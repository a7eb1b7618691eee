use anyhow::Result;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::config::Config;

pub mod models;
pub mod seed;

pub type DbPool = SqlitePool;

pub async fn init(cfg: &Config) -> Result<DbPool> {
    let in_memory = cfg.database.path == ":memory:";
    let pool = connect(&cfg.database.path).await?;

    if !in_memory {
        sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;
        sqlx::query("PRAGMA synchronous=NORMAL").execute(&pool).await?;
    }

    tracing::info!("Database connected: {}", cfg.database.path);
    Ok(pool)
}

/// Opens the pool and applies migrations.
///
/// An in-memory database lives only as long as its connection, so the pool
/// holds exactly one connection open for the whole process.
pub async fn connect(path: &str) -> Result<DbPool> {
    let in_memory = path == ":memory:";
    let options = if in_memory {
        SqliteConnectOptions::from_str("sqlite::memory:")?
    } else {
        SqliteConnectOptions::from_str(&format!("sqlite://{}", path))?.create_if_missing(true)
    }
    .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(if in_memory { 1 } else { 8 })
        .min_connections(1)
        .idle_timeout(None::<std::time::Duration>)
        .max_lifetime(None::<std::time::Duration>)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./src/db/migrations").run(&pool).await?;
    Ok(pool)
}

/// Create the bootstrap admin if no users exist yet.
///
/// The admin must choose a new password at first login.
pub async fn seed_admin(pool: &DbPool, cfg: &Config) -> Result<()> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    if count.0 == 0 {
        let now = Utc::now().to_rfc3339();
        let password = crate::auth::password::hash(&cfg.admin.password)?;

        sqlx::query(
            "INSERT INTO users (name, email, phone, role, assigned_classes, password, is_first_login, created_at, updated_at)
             VALUES (?, '', ?, 'Admin', '[]', ?, 1, ?, ?)"
        )
        .bind(&cfg.admin.name)
        .bind(&cfg.admin.phone)
        .bind(&password)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;

        tracing::warn!(
            "Created bootstrap admin (phone: {}). The password must be changed at first login.",
            cfg.admin.phone
        );
    }

    Ok(())
}
