use axum::{http::Method, routing::get, Router};
use common::models::{Patient, Provider};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{directory, health, metrics};
use crate::state::AppState;

/// Create the main application router with all routes and middleware
#[tracing::instrument(skip(state))]
pub fn create_router(state: AppState) -> Router {
    // Browser callers on other origins may read the listings
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    let directory_routes = Router::new()
        .route("/patients", get(directory::list_entity::<Patient>))
        .route("/patients/filter", get(directory::filter_entity::<Patient>))
        .route("/providers", get(directory::list_entity::<Provider>))
        .route("/providers/filter", get(directory::filter_entity::<Provider>));

    let operational_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler));

    Router::new()
        .merge(directory_routes)
        .merge(operational_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
