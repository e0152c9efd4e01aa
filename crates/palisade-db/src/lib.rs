//! Palisade Database — SurrealDB connection management, schema
//! migrations and repository implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types and boundary translation ([`DbError`])
//! - SurrealDB implementations of the `palisade-core` repository traits
//!
//! Repositories are generic over the SurrealDB engine, so the same code
//! runs against the WebSocket client in production and the in-memory
//! engine in tests.

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};

/// The WebSocket engine's connection type, re-exported so downstream
/// crates can name repository types without depending on `surrealdb`.
pub use surrealdb::engine::remote::ws::Client as WsClient;
