//! Database layer for the staylink channel manager.
//!
//! Owns the PostgreSQL schema, the entity models and their queries. Every
//! table maps to one model module under [`models`]; queries are static
//! methods on the entity types.

pub mod error;
pub mod migrations;
pub mod models;

pub use error::DbError;
pub use migrations::run_migrations;
