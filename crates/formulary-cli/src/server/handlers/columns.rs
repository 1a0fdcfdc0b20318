//! Derived column handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use formulary::DerivedColumnRecord;
use serde::{Deserialize, Serialize};

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Request body for adding a derived column.
#[derive(Deserialize)]
pub struct DeriveRequest {
    pub name: String,
    pub formula: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Response after a removal.
#[derive(Serialize)]
pub struct RemoveResponse {
    pub removed: bool,
}

/// POST /api/columns
pub async fn add_column(
    State(state): State<AppState>,
    Json(req): Json<DeriveRequest>,
) -> Result<(StatusCode, Json<DerivedColumnRecord>), ApiError> {
    let mut session = state.session.write().await;
    let record = session
        .apply_derived_column(&req.name, &req.formula, req.description)?
        .clone();
    Ok((StatusCode::CREATED, Json(record)))
}

/// DELETE /api/columns/:name
pub async fn remove_column(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<RemoveResponse>, ApiError> {
    let mut session = state.session.write().await;
    let removed = session.remove_derived_column(&name)?;
    Ok(Json(RemoveResponse { removed }))
}
