//! # Repository Module
//!
//! Store implementations over the shared SQLite pool.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  SaleRecorder / AggregationEngine                                      │
//! │       │                                                                 │
//! │       │  db.products().reserve_and_decrement("COKE", 2)                │
//! │       ▼                                                                 │
//! │  ProductStore      get, list, create, update,                          │
//! │                    reserve_and_decrement, release, at_or_below         │
//! │  SaleRepository    insert (one tx), get, list, recent                  │
//! │  ExpenseLedger     add, get, list                                      │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod expense;
pub mod product;
pub mod sale;
