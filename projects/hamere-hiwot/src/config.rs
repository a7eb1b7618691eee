use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Allowed CORS origins. Defaults to localhost dev ports.
    /// Set HAMERE__API__CORS_ALLOWED_ORIGINS in production.
    #[serde(default = "default_cors_allowed_origins")]
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `:memory:` keeps everything for the lifetime of the process only.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Loads demo members and two demo accounts sharing the password
    /// `password123`. Off unless asked for; never enable it on a shared host.
    #[serde(default = "default_seed_demo_data")]
    pub seed_demo_data: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_jwt_expiry")]
    pub jwt_expiry_hours: u64,
    #[serde(default = "default_max_login_failures")]
    pub max_login_failures: u32,
    #[serde(default = "default_login_window_secs")]
    pub login_window_secs: u64,
}

/// Bootstrap administrator, created only when the user table is empty.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_name")]
    pub name: String,
    #[serde(default = "default_admin_phone")]
    pub phone: String,
    #[serde(default = "default_admin_password")]
    pub password: String,
}

fn default_bind() -> String { "0.0.0.0".to_string() }
fn default_api_port() -> u16 { 8080 }
fn default_db_path() -> String { ":memory:".to_string() }
fn default_seed_demo_data() -> bool { false }
fn default_jwt_expiry() -> u64 { 24 }
fn default_max_login_failures() -> u32 { 5 }
fn default_login_window_secs() -> u64 { 300 }
fn default_admin_name() -> String { "Administrator".to_string() }
fn default_admin_phone() -> String { "0900000000".to_string() }
fn default_admin_password() -> String { "admin".to_string() }
fn default_cors_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:9002".to_string(),
        "http://localhost:8080".to_string(),
    ]
}

const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

pub fn validate(cfg: &Config) -> Result<()> {
    if cfg.auth.jwt_secret == DEFAULT_JWT_SECRET {
        anyhow::bail!(
            "SECURITY ERROR: JWT secret must be changed from default value '{}'. \
            Set HAMERE__AUTH__JWT_SECRET environment variable with a strong random value.",
            DEFAULT_JWT_SECRET
        );
    }

    if cfg.auth.jwt_secret.len() < 32 {
        anyhow::bail!(
            "CONFIG ERROR: JWT secret must be at least 32 characters (current: {})",
            cfg.auth.jwt_secret.len()
        );
    }

    if cfg.auth.max_login_failures == 0 {
        anyhow::bail!("CONFIG ERROR: auth.max_login_failures must be at least 1");
    }

    if cfg.database.path != ":memory:" {
        if let Some(parent) = std::path::Path::new(&cfg.database.path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                anyhow::bail!(
                    "CONFIG ERROR: Database directory does not exist: {}",
                    parent.display()
                );
            }
        }
    }

    tracing::info!("Configuration validation passed");
    Ok(())
}

pub fn load() -> Result<Config> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name("config").required(false))
        .add_source(
            config::Environment::with_prefix("HAMERE")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("api.cors_allowed_origins")
                .try_parsing(true),
        )
        .set_default("api.bind", "0.0.0.0")?
        .set_default("api.port", 8080)?
        .set_default("database.path", ":memory:")?
        .set_default("database.seed_demo_data", false)?
        .set_default("auth.jwt_secret", DEFAULT_JWT_SECRET)?
        .set_default("auth.jwt_expiry_hours", 24)?
        .set_default("auth.max_login_failures", 5)?
        .set_default("auth.login_window_secs", 300)?
        .set_default("admin.name", "Administrator")?
        .set_default("admin.phone", "0900000000")?
        .set_default("admin.password", "admin")?
        .build()?
        .try_deserialize()?;

    validate(&cfg)?;

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            api: ApiConfig {
                port: 8080,
                bind: "127.0.0.1".to_string(),
                cors_allowed_origins: vec![],
            },
            database: DatabaseConfig {
                path: ":memory:".to_string(),
                seed_demo_data: false,
            },
            auth: AuthConfig {
                jwt_secret: "a-sufficiently-long-secret-for-unit-tests".to_string(),
                jwt_expiry_hours: 1,
                max_login_failures: 5,
                login_window_secs: 300,
            },
            admin: AdminConfig {
                name: "Administrator".to_string(),
                phone: "0900000000".to_string(),
                password: "admin".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&sample()).is_ok());
    }

    #[test]
    fn test_default_secret_rejected() {
        let mut cfg = sample();
        cfg.auth.jwt_secret = DEFAULT_JWT_SECRET.to_string();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut cfg = sample();
        cfg.auth.jwt_secret = "short".to_string();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_demo_data_is_opt_in() {
        let db: DatabaseConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(db.path, ":memory:");
        assert!(!db.seed_demo_data);
    }

    #[test]
    fn test_missing_database_directory_rejected() {
        let mut cfg = sample();
        cfg.database.path = "/definitely/not/a/real/dir/hamere.db".to_string();
        assert!(validate(&cfg).is_err());
    }
}
