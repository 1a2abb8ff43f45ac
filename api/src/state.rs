use common::query::QueryRouter;
use metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub router: QueryRouter,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(router: QueryRouter, metrics: Option<PrometheusHandle>) -> Self {
        Self { router, metrics }
    }
}
