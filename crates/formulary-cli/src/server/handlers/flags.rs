//! Flag rule handlers.

use axum::{extract::State, http::StatusCode, Json};
use formulary::FlagRuleRecord;
use serde::{Deserialize, Serialize};

use super::columns::RemoveResponse;
use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Request body for adding a flag rule.
#[derive(Deserialize)]
pub struct FlagRequest {
    pub rule: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body for removing a flag rule.
#[derive(Deserialize)]
pub struct RemoveFlagRequest {
    pub rule: String,
}

/// An applied flag rule and the column it produced.
#[derive(Serialize)]
pub struct FlagResponse {
    #[serde(flatten)]
    pub record: FlagRuleRecord,
    pub column: String,
}

impl From<FlagRuleRecord> for FlagResponse {
    fn from(record: FlagRuleRecord) -> Self {
        let column = record.column_name();
        Self { record, column }
    }
}

/// POST /api/flags
pub async fn add_flag(
    State(state): State<AppState>,
    Json(req): Json<FlagRequest>,
) -> Result<(StatusCode, Json<FlagResponse>), ApiError> {
    let mut session = state.session.write().await;
    let record = session.apply_flag_rule(&req.rule, req.description)?.clone();
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// POST /api/flags/remove
///
/// The rule is sent in the body.
pub async fn remove_flag(
    State(state): State<AppState>,
    Json(req): Json<RemoveFlagRequest>,
) -> Result<Json<RemoveResponse>, ApiError> {
    let mut session = state.session.write().await;
    let removed = session.remove_flag_rule(&req.rule)?;
    Ok(Json(RemoveResponse { removed }))
}
