//! Table preview, history, crop and expression preview handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use formulary::{ColumnType, Ledger, SourceMetadata, Table, Value};
use serde::{Deserialize, Serialize};

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Default number of rows returned in previews.
const DEFAULT_PREVIEW_ROWS: usize = 100;

/// Column header in a table preview.
#[derive(Serialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

/// Response for table previews.
#[derive(Serialize)]
pub struct TableResponse {
    pub columns: Vec<ColumnInfo>,
    /// Data rows (first N rows).
    pub rows: Vec<Vec<Value>>,
    /// Total row count of the table.
    pub row_count: usize,
    /// Whether the rows were truncated.
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceMetadata>,
}

impl TableResponse {
    pub fn preview(table: &Table, limit: usize, source: Option<&SourceMetadata>) -> Self {
        Self {
            columns: table
                .columns()
                .map(|c| ColumnInfo {
                    name: c.name().to_string(),
                    column_type: c.column_type(),
                })
                .collect(),
            rows: table
                .head(limit)
                .into_iter()
                .map(|row| row.into_iter().cloned().collect())
                .collect(),
            row_count: table.row_count(),
            truncated: table.row_count() > limit,
            source: source.cloned(),
        }
    }
}

#[derive(Deserialize)]
pub struct PreviewQuery {
    pub limit: Option<usize>,
}

/// GET /api/table?limit=N
pub async fn get_table(
    State(state): State<AppState>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<TableResponse>, ApiError> {
    let session = state.session.read().await;
    let limit = query.limit.unwrap_or(DEFAULT_PREVIEW_ROWS);
    Ok(Json(TableResponse::preview(
        session.table()?,
        limit,
        session.source(),
    )))
}

/// GET /api/history
pub async fn get_history(State(state): State<AppState>) -> Json<Ledger> {
    let session = state.session.read().await;
    Json(session.history().clone())
}

/// Request body for cropping.
#[derive(Deserialize)]
pub struct CropRequest {
    pub start: usize,
    pub end: usize,
}

/// POST /api/crop
pub async fn crop_table(
    State(state): State<AppState>,
    Json(req): Json<CropRequest>,
) -> Result<Json<TableResponse>, ApiError> {
    let mut session = state.session.write().await;
    session.crop(req.start, req.end)?;
    Ok(Json(TableResponse::preview(
        session.table()?,
        DEFAULT_PREVIEW_ROWS,
        session.source(),
    )))
}

/// Request body for previewing an expression.
#[derive(Deserialize)]
pub struct EvaluateRequest {
    pub expression: String,
    pub limit: Option<usize>,
}

/// Result of previewing an expression.
#[derive(Serialize)]
pub struct EvaluateResponse {
    pub expression: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub values: Vec<Value>,
    pub length: usize,
}

/// POST /api/evaluate
pub async fn evaluate_expression(
    State(state): State<AppState>,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, ApiError> {
    let session = state.session.read().await;
    let series = session.evaluate(&req.expression)?;
    let limit = req.limit.unwrap_or(DEFAULT_PREVIEW_ROWS);
    Ok(Json(EvaluateResponse {
        expression: req.expression.trim().to_string(),
        column_type: series.column_type(),
        values: series.values().iter().take(limit).cloned().collect(),
        length: series.len(),
    }))
}
