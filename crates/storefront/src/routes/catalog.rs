//! Catalog maintenance handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::Result;
use crate::services::catalog::{RefreshReport, refresh_catalog};
use crate::state::AppState;

/// Refetch products and sizes from the backend.
///
/// A product fetch failure answers 502 and leaves the current catalog in
/// place. A size fetch failure still answers 200, with `sizes_error` set.
#[instrument(skip(state))]
pub async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshReport>> {
    let report =
        refresh_catalog(state.source(), state.shop_mutex(), state.refresh_lock()).await?;
    Ok(Json(report))
}
