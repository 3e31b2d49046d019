//! # emporium-db: Database Layer for Emporium
//!
//! SQLite storage for products, sales and expenses, accessed through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Emporium Data Flow                               │
//! │                                                                         │
//! │  SaleRecorder / AggregationEngine (emporium-engine)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   emporium-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │    │     Stores     │   │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │   │   │
//! │  │   │               │    │ ProductStore   │   │              │   │   │
//! │  │   │ SqlitePool    │◄───│ SaleRepository │   │ 001_init.sql │   │   │
//! │  │   │ ReadSnapshot  │    │ ExpenseLedger  │   │              │   │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL)                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use emporium_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("emporium.db")).await?;
//! let reservation = db.products().reserve_and_decrement("COKE-330", 2).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod snapshot;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use snapshot::ReadSnapshot;

pub use repository::expense::ExpenseLedger;
pub use repository::product::{ProductStore, Reservation};
pub use repository::sale::SaleRepository;
