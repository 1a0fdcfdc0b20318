//! CSV export handler.

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// File name offered to the browser.
const EXPORT_FILE_NAME: &str = "processed_data.csv";

/// GET /api/export
pub async fn export_csv(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let session = state.session.read().await;
    let csv = session.export_csv_string()?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        csv,
    ))
}
