//! Environment-based application configuration.
//!
//! Everything is read from the process environment with sensible
//! development defaults:
//!
//! | Variable            | Default          |
//! |---------------------|------------------|
//! | `APP_ENV`           | `development`    |
//! | `DB_URL`            | `127.0.0.1:8000` |
//! | `DB_NAMESPACE`      | `palisade`       |
//! | `DB_DATABASE`       | `main`           |
//! | `DB_USER`           | `root`           |
//! | `DB_PASS`           | `root`           |
//! | `DEFAULT_PAGE_SIZE` | `50`             |
//! | `PASSWORD_PEPPER`   | unset            |

use palisade_core::query::DEFAULT_PAGE_SIZE;
use palisade_db::DbConfig;
use palisade_service::config::ServiceConfig;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Deployment environment (`development`, `staging`, `production`).
    pub env: String,
    pub db_url: String,
    pub db_namespace: String,
    pub db_database: String,
    pub db_user: String,
    pub db_pass: String,
    pub default_page_size: u32,
    pub pepper: Option<String>,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl AppConfig {
    pub fn from_env() -> Self {
        let default_page_size = std::env::var("DEFAULT_PAGE_SIZE")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Self {
            env: env_or("APP_ENV", "development"),
            db_url: env_or("DB_URL", "127.0.0.1:8000"),
            db_namespace: env_or("DB_NAMESPACE", "palisade"),
            db_database: env_or("DB_DATABASE", "main"),
            db_user: env_or("DB_USER", "root"),
            db_pass: env_or("DB_PASS", "root"),
            default_page_size,
            pepper: std::env::var("PASSWORD_PEPPER").ok(),
        }
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            url: self.db_url.clone(),
            namespace: self.db_namespace.clone(),
            database: self.db_database.clone(),
            username: self.db_user.clone(),
            password: self.db_pass.clone(),
        }
    }

    /// Company restore stays available outside production.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            default_page_size: self.default_page_size,
            allow_restore: self.env != "production",
            pepper: self.pepper.clone(),
        }
    }
}
