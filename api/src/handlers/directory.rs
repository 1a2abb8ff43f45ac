// Listing handlers, shared by every entity
// Which column a request may filter on comes from the entity descriptor.

use axum::{
    extract::{Query, State},
    response::Html,
};
use common::models::Entity;
use std::collections::HashMap;

use crate::handlers::ErrorResponse;
use crate::state::AppState;
use crate::templates;

/// `GET /<collection>`
#[tracing::instrument(skip(state), fields(entity = E::DESCRIPTOR.name))]
pub async fn list_entity<E: Entity>(
    State(state): State<AppState>,
) -> Result<Html<String>, ErrorResponse> {
    respond::<E>(&state, None, E::DESCRIPTOR.list_error).await
}

/// `GET /<collection>/filter?<filter_column>=value`
///
/// Without the parameter the whole collection is listed.
#[tracing::instrument(skip(state, params), fields(entity = E::DESCRIPTOR.name))]
pub async fn filter_entity<E: Entity>(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Html<String>, ErrorResponse> {
    let value = params.get(E::DESCRIPTOR.filter_column).cloned();
    respond::<E>(&state, value, E::DESCRIPTOR.filter_error).await
}

async fn respond<E: Entity>(
    state: &AppState,
    filter: Option<String>,
    failure_message: &'static str,
) -> Result<Html<String>, ErrorResponse> {
    // The router logs the underlying error
    let rows = state
        .router
        .list_entity::<E>(filter)
        .await
        .map_err(|_| ErrorResponse::internal(failure_message))?;

    let html = templates::render_rows(&rows).map_err(|e| {
        tracing::error!(
            template = E::DESCRIPTOR.template,
            error = %e,
            "Template rendering failed"
        );
        ErrorResponse::internal(failure_message)
    })?;

    Ok(Html(html))
}
