//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, a config and the
//! full [`AppContext`]. The [`TestHarness::with_server`] constructor starts
//! Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;

use reg_core::config::Config;
use reg_core::UserId;
use reg_db::pool::{init_memory_pool, DbPool};
use reg_server::context::AppContext;
use reg_server::router::build_router;
use serde_json::Value;

/// Test harness wrapping a fully-constructed [`AppContext`].
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
}

impl TestHarness {
    /// Create a new harness with default configuration and in-memory DB.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration and in-memory DB.
    pub fn with_config(config: Config) -> Self {
        let db = init_memory_pool().expect("failed to create in-memory pool");
        Self::with_pool(db, config)
    }

    /// Wrap an existing pool, e.g. a file-backed one.
    pub fn with_pool(db: DbPool, config: Config) -> Self {
        let ctx = AppContext::new(db.clone(), config);
        Self { ctx, db }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::new().serve().await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        Self::with_config(config).serve().await
    }

    pub async fn serve(self) -> (Self, SocketAddr) {
        let app = build_router(self.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (self, addr)
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> reg_db::pool::PooledConnection {
        reg_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    /// Insert a user directly, bypassing HTTP.
    pub fn create_user(&self, username: &str) -> UserId {
        let conn = self.conn();
        reg_db::queries::users::create_user(&conn, &reg_db::queries::users::NewUser::new(username))
            .expect("failed to create user")
            .id
    }

    /// Count rows in `table`.
    pub fn count(&self, table: &str) -> i64 {
        self.conn()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .expect("count query failed")
    }
}

/// POST `body` to `url` and return the status with the parsed JSON body.
pub async fn post_json(client: &reqwest::Client, url: String, body: Value) -> (u16, Value) {
    let resp = client.post(url).json(&body).send().await.unwrap();
    let status = resp.status().as_u16();
    let json = resp.json().await.unwrap_or(Value::Null);
    (status, json)
}

/// PUT `body` to `url` and return the status with the parsed JSON body.
pub async fn put_json(client: &reqwest::Client, url: String, body: Value) -> (u16, Value) {
    let resp = client.put(url).json(&body).send().await.unwrap();
    let status = resp.status().as_u16();
    let json = resp.json().await.unwrap_or(Value::Null);
    (status, json)
}

/// GET `url` and return the status with the parsed JSON body.
pub async fn get_json(client: &reqwest::Client, url: String) -> (u16, Value) {
    let resp = client.get(url).send().await.unwrap();
    let status = resp.status().as_u16();
    let json = resp.json().await.unwrap_or(Value::Null);
    (status, json)
}

/// DELETE `url` and return the status.
pub async fn delete(client: &reqwest::Client, url: String) -> u16 {
    client.delete(url).send().await.unwrap().status().as_u16()
}
