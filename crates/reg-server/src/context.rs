//! Shared application state.
//!
//! [`AppContext`] is handed to every route handler through Axum state. It is
//! cheap to clone: the pool and the configuration are both reference counted.

use std::sync::Arc;

use reg_core::config::Config;
use reg_db::pool::DbPool;

#[derive(Clone)]
pub struct AppContext {
    pub db: DbPool,
    pub config: Arc<Config>,
}

impl AppContext {
    pub fn new(db: DbPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}
