//! # emporium-engine: Sale Recording and Dashboard Aggregation
//!
//! Multi-step units of work over the Emporium stores.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Emporium Architecture                            │
//! │                                                                         │
//! │  emporium CLI / rendering layer                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               emporium-engine (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   Engine ──┬── SaleRecorder       reserve ► build ► persist     │   │
//! │  │            ├── AggregationEngine  snapshot ► metrics            │   │
//! │  │            └── stores             products, sales, expenses     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  emporium-db ──► SQLite                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use emporium_engine::{Engine, EngineConfig};
//! use emporium_core::{SaleLine, WindowPreset};
//!
//! let engine = Engine::open(EngineConfig::load(None)?).await?;
//! let sale = engine
//!     .recorder()
//!     .record_sale(&[SaleLine::new("COKE-330", 2)])
//!     .await?;
//! let today = engine.aggregation().compute_preset(WindowPreset::Today).await?;
//! ```

pub mod aggregation;
pub mod config;
pub mod error;
pub mod recorder;

pub use aggregation::AggregationEngine;
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult, SaleError, SaleResult, Shortfall};
pub use recorder::SaleRecorder;

use emporium_db::{Database, DbConfig, ExpenseLedger, ProductStore, SaleRepository};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Owns the database handle and the services built on it.
///
/// Cheap to clone; clones share the pool.
#[derive(Debug, Clone)]
pub struct Engine {
    db: Database,
    recorder: SaleRecorder,
    aggregation: AggregationEngine,
    config: EngineConfig,
}

impl Engine {
    /// Opens the configured database (running migrations) and wires the
    /// services.
    pub async fn open(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let db = Database::new(config.db_config()).await?;
        info!(
            path = %config.database.path.display(),
            "Engine ready"
        );
        Ok(Self::with_database(db, config))
    }

    /// Engine over a fresh in-memory database.
    pub async fn in_memory() -> EngineResult<Self> {
        let db = Database::new(DbConfig::in_memory()).await?;
        Ok(Self::with_database(db, EngineConfig::default()))
    }

    pub fn with_database(db: Database, config: EngineConfig) -> Self {
        Engine {
            recorder: SaleRecorder::new(&db, config.sales.clone()),
            aggregation: AggregationEngine::new(&db, config.metrics_settings()),
            db,
            config,
        }
    }

    pub fn recorder(&self) -> &SaleRecorder {
        &self.recorder
    }

    pub fn aggregation(&self) -> &AggregationEngine {
        &self.aggregation
    }

    pub fn products(&self) -> ProductStore {
        self.db.products()
    }

    pub fn sales(&self) -> SaleRepository {
        self.db.sales()
    }

    pub fn expenses(&self) -> ExpenseLedger {
        self.db.expenses()
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn close(&self) {
        self.db.close().await;
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=emporium_engine=trace` - Trace for the engine only
/// - Default: INFO level, sqlx at WARN
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
