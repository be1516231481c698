//! reg-db: database access and persistence layer.
//!
//! This crate provides SQLite-backed storage with connection pooling,
//! embedded migrations, typed models, query modules for every registrar
//! entity, and the delete-propagation engine that applies cascade and
//! nullify rules when rows are removed.

pub mod integrity;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;

mod support;
