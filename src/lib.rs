//! Migrates documents and index metadata between two Elasticsearch-style
//! clusters: a scroll cursor on the source feeds a bounded queue, a pool of
//! workers drains it into size-bounded `_bulk` writes on the destination.

pub mod conf;
pub mod error;
pub mod es_client;
pub mod health;
pub mod migrate;
pub mod models;
pub mod provision;
pub mod resolver;
pub mod settings;

pub use conf::{Config, Endpoint};
pub use error::{MigrateError, Result};
pub use es_client::EsClient;
pub use migrate::{CopyOptions, CopyStats, FlushErrorPolicy};
