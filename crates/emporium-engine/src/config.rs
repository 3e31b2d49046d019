//! # Engine Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     EMPORIUM_DB_PATH=/srv/emporium.db                                  │
//! │     EMPORIUM_CRITICAL_STOCK=3                                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, or                                                │
//! │     ~/.config/emporium/emporium.toml (Linux)                           │
//! │     ~/Library/Application Support/com.emporium.emporium/emporium.toml  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "./emporium.db"
//! max_connections = 5
//! busy_timeout_ms = 5000
//!
//! [sales]
//! persist_max_attempts = 3
//! initial_backoff_ms = 50
//! max_backoff_ms = 1000
//!
//! [dashboard]
//! critical_stock_threshold = 5
//! top_products_limit = 5
//! recent_sales_limit = 5
//! trend_days = 7
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use emporium_core::MetricsSettings;
use emporium_db::DbConfig;

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a writer waits for SQLite's write lock.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./emporium.db")
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout() -> u64 {
    5_000
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

// =============================================================================
// Sale Settings
// =============================================================================

/// Retry policy for writing a sale record once stock is reserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleSettings {
    /// Total attempts, including the first.
    #[serde(default = "default_persist_attempts")]
    pub persist_max_attempts: u32,

    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

fn default_persist_attempts() -> u32 {
    3
}

fn default_initial_backoff() -> u64 {
    50
}

fn default_max_backoff() -> u64 {
    1_000
}

impl Default for SaleSettings {
    fn default() -> Self {
        SaleSettings {
            persist_max_attempts: default_persist_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

impl SaleSettings {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

// =============================================================================
// Dashboard Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSettings {
    /// Products with this many units or fewer are critical.
    #[serde(default = "default_critical_threshold")]
    pub critical_stock_threshold: i64,

    #[serde(default = "default_top_products")]
    pub top_products_limit: usize,

    #[serde(default = "default_recent_sales")]
    pub recent_sales_limit: u32,

    #[serde(default = "default_trend_days")]
    pub trend_days: u32,
}

fn default_critical_threshold() -> i64 {
    emporium_core::DEFAULT_CRITICAL_STOCK_THRESHOLD
}

fn default_top_products() -> usize {
    emporium_core::DEFAULT_TOP_PRODUCTS_LIMIT
}

fn default_recent_sales() -> u32 {
    5
}

fn default_trend_days() -> u32 {
    7
}

impl Default for DashboardSettings {
    fn default() -> Self {
        DashboardSettings {
            critical_stock_threshold: default_critical_threshold(),
            top_products_limit: default_top_products(),
            recent_sales_limit: default_recent_sales(),
            trend_days: default_trend_days(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub sales: SaleSettings,

    #[serde(default)]
    pub dashboard: DashboardSettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, else the platform config dir)
    /// 3. Environment variables
    ///
    /// An explicit `config_path` that does not exist is an error; a missing
    /// default file is not.
    pub fn load(config_path: Option<PathBuf>) -> EngineResult<Self> {
        let mut config = match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(EngineError::ConfigLoadFailed(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                Self::from_file(&path)?
            }
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> EngineResult<Self> {
        info!(?path, "Loading engine config from file");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> EngineResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(EngineError::InvalidConfig(
                "database.path must not be empty".into(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(EngineError::InvalidConfig(
                "database.max_connections must be greater than 0".into(),
            ));
        }
        if self.sales.persist_max_attempts == 0 {
            return Err(EngineError::InvalidConfig(
                "sales.persist_max_attempts must be at least 1".into(),
            ));
        }
        if self.sales.initial_backoff_ms > self.sales.max_backoff_ms {
            return Err(EngineError::InvalidConfig(format!(
                "sales.initial_backoff_ms ({}) exceeds sales.max_backoff_ms ({})",
                self.sales.initial_backoff_ms, self.sales.max_backoff_ms
            )));
        }
        if self.dashboard.critical_stock_threshold < 0 {
            return Err(EngineError::InvalidConfig(
                "dashboard.critical_stock_threshold must not be negative".into(),
            ));
        }
        if self.dashboard.trend_days == 0 {
            return Err(EngineError::InvalidConfig(
                "dashboard.trend_days must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("EMPORIUM_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(value) = std::env::var("EMPORIUM_MAX_CONNECTIONS") {
            match value.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %value, "Ignoring invalid EMPORIUM_MAX_CONNECTIONS"),
            }
        }

        if let Ok(value) = std::env::var("EMPORIUM_PERSIST_ATTEMPTS") {
            match value.parse::<u32>() {
                Ok(n) => self.sales.persist_max_attempts = n,
                Err(_) => warn!(value = %value, "Ignoring invalid EMPORIUM_PERSIST_ATTEMPTS"),
            }
        }

        if let Ok(value) = std::env::var("EMPORIUM_CRITICAL_STOCK") {
            match value.parse::<i64>() {
                Ok(n) => self.dashboard.critical_stock_threshold = n,
                Err(_) => warn!(value = %value, "Ignoring invalid EMPORIUM_CRITICAL_STOCK"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "emporium", "emporium")
            .map(|dirs| dirs.config_dir().join("emporium.toml"))
    }

    // =========================================================================
    // Derived Settings
    // =========================================================================

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
    }

    pub fn metrics_settings(&self) -> MetricsSettings {
        MetricsSettings {
            critical_stock_threshold: self.dashboard.critical_stock_threshold,
            top_products_limit: self.dashboard.top_products_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sales.persist_max_attempts, 3);
        assert_eq!(config.dashboard.critical_stock_threshold, 5);
        assert_eq!(config.dashboard.trend_days, 7);
        assert_eq!(config.metrics_settings(), MetricsSettings::default());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml(
            r#"
            [database]
            path = "/srv/shop.db"

            [dashboard]
            critical_stock_threshold = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.database.path, PathBuf::from("/srv/shop.db"));
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.dashboard.critical_stock_threshold, 2);
        assert_eq!(config.dashboard.top_products_limit, 5);
        assert_eq!(config.sales, SaleSettings::default());

        let db = config.db_config();
        assert_eq!(db.database_path, PathBuf::from("/srv/shop.db"));
        assert_eq!(db.busy_timeout, Duration::from_millis(5_000));
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();
        config.sales.persist_max_attempts = 0;
        assert!(config.validate().is_err());

        config.sales.persist_max_attempts = 1;
        config.sales.initial_backoff_ms = 2_000;
        assert!(config.validate().is_err());

        config.sales.initial_backoff_ms = 10;
        config.dashboard.critical_stock_threshold = -1;
        assert!(config.validate().is_err());

        config.dashboard.critical_stock_threshold = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emporium.toml");
        std::fs::write(&path, "[sales]\npersist_max_attempts = 5\n").unwrap();

        let config = EngineConfig::load(Some(path)).unwrap();
        assert_eq!(config.sales.persist_max_attempts, 5);

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            EngineConfig::load(Some(missing)),
            Err(EngineError::ConfigLoadFailed(_))
        ));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            EngineConfig::from_toml("[sales]\npersist_max_attempts = \"many\""),
            Err(EngineError::ConfigLoadFailed(_))
        ));
    }
}
