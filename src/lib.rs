//! # Starlog
//!
//! A star-schema warehouse ingester for energy-label telemetry runs.
//!
//! A run arrives over HTTP, and a single declarative schema drives
//! everything that happens next: the DDL that shapes the warehouse,
//! the lookups that resolve which dimension rows already exist, and
//! the INSERTs that materialize the missing dimensions plus the fact
//! row. The storage engine is columnar and offers no auto-increment,
//! so dimension ids come from an in-process surrogate-key bank.
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │                    star schema                      │
//! │   Fact → Plugin → PluginName, Browser → BrowserName,│
//! │          Url → Domain, ErrorMessage                 │
//! └────────────────────────────────────────────────────┘
//!            │                │               │
//!            ▼                ▼               ▼
//!        sql::ddl        sql::lookup     sql::insert
//!      (CREATE/DROP)    (resolve ids)   (materialize)
//!            └────────────────┴───────────────┘
//!                             │
//!                      store::Warehouse
//!               (pooled transactional executor)
//! ```
//!
//! The emitters are pure: they produce per-table SQL strings and
//! never see a connection. [`store::Warehouse`] is the only
//! component that talks to the database.

pub mod config;
pub mod error;
pub mod keys;
pub mod record;
pub mod schema;
pub mod sql;
pub mod store;
pub mod web;

pub use config::Settings;
pub use error::{Result, StoreError};
pub use record::Run;
pub use store::Warehouse;
