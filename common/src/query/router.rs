// Query router: one entry point per (entity, optional filter)

use crate::db::{ConnectionHealth, QueryExecutor};
use crate::errors::QueryExecutionError;
use crate::models::{Entity, EntityDescriptor, Patient, Provider, Record, RowSet};
use crate::query::resolver::resolve;
use crate::telemetry;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, instrument};

/// Resolves listing requests into queries and runs them on the injected
/// executor.
#[derive(Clone)]
pub struct QueryRouter {
    executor: Arc<dyn QueryExecutor>,
}

impl std::fmt::Debug for QueryRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryRouter").finish_non_exhaustive()
    }
}

impl QueryRouter {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }

    /// Health of the underlying store connection
    pub async fn health(&self) -> ConnectionHealth {
        self.executor.health().await
    }

    pub async fn list_patients(&self) -> Result<RowSet<Patient>, QueryExecutionError> {
        self.list_entity(None).await
    }

    pub async fn filter_patients_by_first_name(
        &self,
        first_name: impl Into<String>,
    ) -> Result<RowSet<Patient>, QueryExecutionError> {
        self.list_entity(Some(first_name.into())).await
    }

    pub async fn list_providers(&self) -> Result<RowSet<Provider>, QueryExecutionError> {
        self.list_entity(None).await
    }

    pub async fn filter_providers_by_specialty(
        &self,
        provider_specialty: impl Into<String>,
    ) -> Result<RowSet<Provider>, QueryExecutionError> {
        self.list_entity(Some(provider_specialty.into())).await
    }

    /// List an entity, optionally filtered on its designated column.
    ///
    /// `None` lists the whole collection.
    pub async fn list_entity<E: Entity>(
        &self,
        filter: Option<String>,
    ) -> Result<RowSet<E>, QueryExecutionError> {
        let descriptor = E::DESCRIPTOR;
        let records = self.fetch_records(descriptor, filter).await?;

        let rows = records
            .into_iter()
            .map(|record| serde_json::from_value::<E>(serde_json::Value::Object(record)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                error!(entity = descriptor.name, error = %e, "Failed to convert store rows");
                telemetry::record_query_failure(descriptor.name, "decode");
                QueryExecutionError::Decode {
                    entity: descriptor.name,
                    reason: e.to_string(),
                }
            })?;

        Ok(RowSet::new(rows))
    }

    /// Execute the resolved query and return the raw records
    #[instrument(skip(self, descriptor, filter), fields(entity = descriptor.name, filtered = filter.is_some()))]
    pub async fn fetch_records(
        &self,
        descriptor: &'static EntityDescriptor,
        filter: Option<String>,
    ) -> Result<Vec<Record>, QueryExecutionError> {
        let filtered = filter.is_some();
        telemetry::record_query(descriptor.name, filtered);

        if !self.executor.health().await.is_connected() {
            self.executor.request_reconnect();
            let err = QueryExecutionError::StoreUnavailable(
                "no live connection to the store".to_string(),
            );
            error!(error = %err, "Rejecting query while the store is disconnected");
            telemetry::record_query_failure(descriptor.name, err.reason());
            return Err(err);
        }

        let query = resolve(descriptor, filter);
        let started = Instant::now();
        let result = self.executor.fetch_all(&query).await;
        telemetry::record_query_duration(descriptor.name, started.elapsed().as_secs_f64());

        match result {
            Ok(records) => {
                debug!(row_count = records.len(), "Query completed");
                Ok(records)
            }
            Err(e) => {
                error!(error = %e, "Query execution failed");
                let err = QueryExecutionError::from(e);
                telemetry::record_query_failure(descriptor.name, err.reason());
                Err(err)
            }
        }
    }
}
