//! tubedigest-db: the shared content store.
//!
//! SQLite via rusqlite with r2d2 connection pooling. Every worker reads its
//! batch with a stage-scoped query and writes back through a guarded update,
//! so an item only ever moves forward through [`Stage`](tubedigest_common::Stage).
//!
//! # Modules
//!
//! - `migrations` - Embedded schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Channel, content, and feature operations
//!
//! # Example
//!
//! ```no_run
//! use tubedigest_common::Stage;
//! use tubedigest_db::pool::{get_conn, init_pool, PoolSettings};
//! use tubedigest_db::queries::contents;
//!
//! let pool = init_pool("tubedigest.db", &PoolSettings::default()).unwrap();
//! let conn = get_conn(&pool).unwrap();
//! let pending = contents::list_ready(&conn, Stage::Discovered, None).unwrap();
//! println!("{} items waiting for captions", pending.len());
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
