//! Suggestion handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use formulary::{suggest_with, DerivedColumnRecord, SuggestionSet};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::flags::FlagResponse;
use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Request body for asking the LLM.
#[derive(Deserialize)]
pub struct SuggestRequest {
    pub query: String,
}

/// Validated suggestions. On provider or schema failure the set is empty and
/// `warning` explains why.
#[derive(Serialize)]
pub struct SuggestResponse {
    pub suggestions: SuggestionSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// POST /api/suggestions
pub async fn request_suggestions(
    State(state): State<AppState>,
    Json(req): Json<SuggestRequest>,
) -> Result<Json<SuggestResponse>, ApiError> {
    let provider = state.llm_provider.clone().ok_or_else(|| {
        ApiError::BadRequest(
            "LLM features are disabled. Restart the server with --llm to enable them.".to_string(),
        )
    })?;

    // Copy the columns so the session lock is not held during the request
    let columns = state.session.read().await.column_names()?;

    let query = req.query;
    let outcome =
        tokio::task::spawn_blocking(move || suggest_with(provider.as_ref(), &query, &columns))
            .await
            .map_err(|e| ApiError::Internal(format!("Suggestion task failed: {}", e)))?;

    let (suggestions, warning) = match outcome {
        Ok(set) => (set, None),
        Err(e) => {
            warn!(error = %e, "suggestions unavailable");
            (SuggestionSet::empty(), Some(e.to_string()))
        }
    };

    *state.suggestions.write().await = suggestions.clone();
    Ok(Json(SuggestResponse {
        suggestions,
        warning,
    }))
}

/// POST /api/suggestions/columns/:index/apply
pub async fn apply_suggested_column(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<(StatusCode, Json<DerivedColumnRecord>), ApiError> {
    let suggestions = state.suggestions.read().await;
    let mut session = state.session.write().await;
    let record = session.apply_suggested_column(&suggestions, index)?.clone();
    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /api/suggestions/flags/:index/apply
pub async fn apply_suggested_flag(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<(StatusCode, Json<FlagResponse>), ApiError> {
    let suggestions = state.suggestions.read().await;
    let mut session = state.session.write().await;
    let record = session.apply_suggested_rule(&suggestions, index)?.clone();
    Ok((StatusCode::CREATED, Json(record.into())))
}
