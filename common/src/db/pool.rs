// MySQL connection pool implementation
// Bounded pool with health tracking and reconnect-with-backoff

use crate::config::{DatabaseConfig, ReconnectConfig};
use crate::db::{ConnectionHealth, QueryExecutor};
use crate::errors::DatabaseError;
use crate::models::{Column, ColumnKind, Record};
use crate::query::ParameterizedQuery;
use crate::retry::{ExponentialBackoff, RetryStrategy};
use crate::telemetry;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Row;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

/// Database connection pool wrapper
///
/// Cheap to clone; all clones share one pool and one health state.
#[derive(Debug, Clone)]
pub struct DbPool {
    inner: Arc<DbPoolInner>,
}

#[derive(Debug)]
struct DbPoolInner {
    pool: MySqlPool,
    health: RwLock<ConnectionHealth>,
    reconnecting: AtomicBool,
    backoff: ExponentialBackoff,
    connect_timeout: Duration,
    query_timeout: Duration,
}

impl DbPool {
    /// Create the pool and attempt the initial connection.
    ///
    /// Never fails: when the store cannot be reached the error is logged, the
    /// pool starts out `Disconnected` and a reconnect cycle is started in the
    /// background.
    #[instrument(skip_all, fields(host = %config.host, database = %config.name))]
    pub async fn connect(config: &DatabaseConfig, reconnect: &ReconnectConfig) -> Self {
        info!("Initializing database connection pool");

        let db = Self::new_lazy(config, reconnect);

        match db.health_check().await {
            Ok(()) => {
                db.set_health(ConnectionHealth::Connected).await;
                info!(
                    max_connections = config.max_connections,
                    "Database connection pool initialized successfully"
                );
            }
            Err(e) => {
                error!(error = %e, "Failed to connect to MySQL, continuing without a store connection");
                db.start_reconnect(true);
            }
        }

        db
    }

    /// Build the pool without touching the network. Health starts `Disconnected`.
    pub fn new_lazy(config: &DatabaseConfig, reconnect: &ReconnectConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name);

        let connect_timeout = Duration::from_secs(config.connect_timeout_seconds);
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(connect_timeout)
            .connect_lazy_with(options);

        telemetry::set_store_connected(false);

        Self {
            inner: Arc::new(DbPoolInner {
                pool,
                health: RwLock::new(ConnectionHealth::Disconnected),
                reconnecting: AtomicBool::new(false),
                backoff: ExponentialBackoff::from(reconnect),
                connect_timeout,
                query_timeout: Duration::from_secs(config.query_timeout_seconds),
            }),
        }
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &MySqlPool {
        &self.inner.pool
    }

    /// Perform a health check on the database connection
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        let ping = sqlx::query("SELECT 1").execute(&self.inner.pool);

        match tokio::time::timeout(self.inner.connect_timeout, ping).await {
            Ok(Ok(_)) => {
                tracing::debug!("Database health check passed");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Database health check failed");
                Err(DatabaseError::HealthCheckFailed(e.to_string()))
            }
            Err(_) => {
                warn!("Database health check timed out");
                Err(DatabaseError::HealthCheckFailed(format!(
                    "no response within {} seconds",
                    self.inner.connect_timeout.as_secs()
                )))
            }
        }
    }

    /// Get the current number of connections in the pool
    pub fn size(&self) -> u32 {
        self.inner.pool.size()
    }

    /// Get the number of idle connections in the pool
    pub fn num_idle(&self) -> usize {
        self.inner.pool.num_idle()
    }

    /// Close the connection pool gracefully
    #[instrument(skip(self))]
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.inner.pool.close().await;
        self.set_health(ConnectionHealth::Disconnected).await;
        info!("Database connection pool closed");
    }

    async fn set_health(&self, health: ConnectionHealth) {
        let mut current = self.inner.health.write().await;
        if *current != health {
            info!(from = ?*current, to = ?health, "Store connection health changed");
        }
        *current = health;
        telemetry::set_store_connected(health.is_connected());
    }

    /// Spawn the reconnect cycle unless one is already running.
    ///
    /// `after_failure` means the store was just found unreachable, so the
    /// first ping waits one backoff delay.
    fn start_reconnect(&self, after_failure: bool) {
        if self
            .inner
            .reconnecting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let db = self.clone();
        tokio::spawn(async move {
            db.reconnect_with_backoff(after_failure).await;
            db.inner.reconnecting.store(false, Ordering::SeqCst);
        });
    }

    /// Ping with backoff until the store answers or the attempt budget runs out
    async fn reconnect_with_backoff(&self, after_failure: bool) -> bool {
        if after_failure {
            if let Some(delay) = self.inner.backoff.next_delay(0) {
                tokio::time::sleep(delay).await;
            }
        }

        let mut attempt = 0;
        loop {
            if self.inner.pool.is_closed() {
                return false;
            }

            match self.health_check().await {
                Ok(()) => {
                    self.set_health(ConnectionHealth::Connected).await;
                    info!(attempt, "Store connection re-established");
                    return true;
                }
                Err(e) => match self.inner.backoff.next_delay(attempt) {
                    Some(delay) => {
                        warn!(
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "Reconnect attempt failed, backing off"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        error!(
                            attempts = attempt,
                            error = %e,
                            "Giving up on reconnecting to the store until the next request"
                        );
                        return false;
                    }
                },
            }
        }
    }
}

#[async_trait]
impl QueryExecutor for DbPool {
    #[instrument(skip_all, fields(entity = query.entity.name, params = query.params.len()))]
    async fn fetch_all(&self, query: &ParameterizedQuery) -> Result<Vec<Record>, DatabaseError> {
        let mut statement = sqlx::query(&query.text);
        for param in &query.params {
            statement = statement.bind(param.as_str());
        }

        let rows = match tokio::time::timeout(
            self.inner.query_timeout,
            statement.fetch_all(&self.inner.pool),
        )
        .await
        {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => {
                let err = classify_checkout_failure(DatabaseError::from(e), self.inner.pool.size());
                if err.is_connection_error() {
                    self.set_health(ConnectionHealth::Disconnected).await;
                    self.start_reconnect(true);
                }
                return Err(err);
            }
            Err(_) => return Err(DatabaseError::Timeout(self.inner.query_timeout.as_secs())),
        };

        rows.iter()
            .map(|row| decode_row(row, query.entity.columns))
            .collect()
    }

    async fn health(&self) -> ConnectionHealth {
        *self.inner.health.read().await
    }

    fn request_reconnect(&self) {
        self.start_reconnect(false);
    }
}

/// A checkout timeout is saturation while connections are open. With none
/// open, no connection could be established and the store counts as lost.
fn classify_checkout_failure(err: DatabaseError, open_connections: u32) -> DatabaseError {
    match err {
        DatabaseError::PoolExhausted if open_connections == 0 => DatabaseError::ConnectionFailed(
            "no connection to the store could be opened".to_string(),
        ),
        other => other,
    }
}

/// Convert a row into a record holding exactly the declared columns
fn decode_row(row: &MySqlRow, columns: &[Column]) -> Result<Record, DatabaseError> {
    let mut record = Record::new();

    for column in columns {
        let value = match column.kind {
            // Unsigned ids do not decode as i64
            ColumnKind::Integer => match row.try_get::<Option<i64>, _>(column.name) {
                Ok(v) => json!(v),
                Err(_) => json!(row.try_get::<Option<u64>, _>(column.name)?),
            },
            ColumnKind::Text => json!(row.try_get::<Option<String>, _>(column.name)?),
            ColumnKind::Date => json!(row
                .try_get::<Option<NaiveDate>, _>(column.name)?
                .map(|d| d.to_string())),
        };
        record.insert(column.name.to_string(), value);
    }

    Ok(record)
}
