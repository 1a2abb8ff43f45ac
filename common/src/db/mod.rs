// Database layer module
// MySQL connection pool plus the execution seam the query router depends on

pub mod pool;

pub use pool::DbPool;

use crate::errors::DatabaseError;
use crate::models::Record;
use crate::query::ParameterizedQuery;
use async_trait::async_trait;

/// Reachability of the store as last observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionHealth {
    Connected,
    Disconnected,
}

impl ConnectionHealth {
    pub fn is_connected(self) -> bool {
        matches!(self, ConnectionHealth::Connected)
    }
}

/// Executes resolved queries against the store.
///
/// Implementations must send `query.params` as bound parameters and decode
/// exactly the columns declared by `query.entity`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run a SELECT and return every row, or fail without returning any
    async fn fetch_all(&self, query: &ParameterizedQuery) -> Result<Vec<Record>, DatabaseError>;

    /// Current health state
    async fn health(&self) -> ConnectionHealth;

    /// Ask the executor to start re-establishing its connection.
    /// Must return immediately.
    fn request_reconnect(&self) {}
}
