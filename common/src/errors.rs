// Error handling framework

use thiserror::Error;

/// Database-specific errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Database health check failed: {0}")]
    HealthCheckFailed(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Query timed out after {0} seconds")]
    Timeout(u64),

    #[error("Timed out waiting for a free pooled connection")]
    PoolExhausted,

    #[error("Failed to decode column '{column}': {reason}")]
    Decode { column: String, reason: String },
}

impl DatabaseError {
    /// Whether this failure means the store itself is unreachable, as opposed
    /// to a problem with one statement.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_) | DatabaseError::HealthCheckFailed(_)
        )
    }
}

/// Failure of a router operation. Rows are never returned alongside one.
#[derive(Error, Debug)]
pub enum QueryExecutionError {
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error(transparent)]
    Execution(#[from] DatabaseError),

    #[error("Row conversion failed for {entity}: {reason}")]
    Decode { entity: &'static str, reason: String },
}

impl QueryExecutionError {
    /// Short label used for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            QueryExecutionError::StoreUnavailable(_) => "unavailable",
            QueryExecutionError::Execution(DatabaseError::Timeout(_)) => "timeout",
            QueryExecutionError::Execution(DatabaseError::PoolExhausted) => "busy",
            QueryExecutionError::Execution(e) if e.is_connection_error() => "connection",
            QueryExecutionError::Execution(_) => "query",
            QueryExecutionError::Decode { .. } => "decode",
        }
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => DatabaseError::ConnectionFailed(err.to_string()),
            // Saturation, not loss of the store
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Database(db_err) => DatabaseError::QueryFailed(db_err.message().to_string()),
            sqlx::Error::ColumnDecode { index, source } => DatabaseError::Decode {
                column: index,
                reason: source.to_string(),
            },
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_not_connection_error() {
        let err: DatabaseError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DatabaseError::PoolExhausted));
        assert!(!err.is_connection_error());
        assert_eq!(QueryExecutionError::from(err).reason(), "busy");
    }

    #[test]
    fn test_pool_closed_is_connection_error() {
        let err: DatabaseError = sqlx::Error::PoolClosed.into();
        assert!(err.is_connection_error());
    }

    #[test]
    fn test_row_not_found_is_statement_error() {
        let err: DatabaseError = sqlx::Error::RowNotFound.into();
        assert!(!err.is_connection_error());
        assert!(matches!(err, DatabaseError::QueryFailed(_)));
    }

    #[test]
    fn test_timeout_display() {
        let err = DatabaseError::Timeout(30);
        assert!(err.to_string().contains("30 seconds"));
    }

    #[test]
    fn test_execution_error_reason_labels() {
        assert_eq!(
            QueryExecutionError::StoreUnavailable("down".into()).reason(),
            "unavailable"
        );
        assert_eq!(
            QueryExecutionError::from(DatabaseError::Timeout(5)).reason(),
            "timeout"
        );
        assert_eq!(
            QueryExecutionError::from(DatabaseError::ConnectionFailed("reset".into())).reason(),
            "connection"
        );
        assert_eq!(
            QueryExecutionError::from(DatabaseError::QueryFailed("syntax".into())).reason(),
            "query"
        );
    }

    #[test]
    fn test_execution_error_keeps_driver_message() {
        let err = QueryExecutionError::from(DatabaseError::QueryFailed(
            "Unknown column 'x'".to_string(),
        ));
        assert!(err.to_string().contains("Unknown column 'x'"));
    }
}
