use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::export::{export_csv, export_file_name};

/// `GET /api/export.csv`: completed records as a CSV attachment.
pub async fn csv(State(ctx): State<ApiContext>) -> Result<impl IntoResponse, ApiError> {
    let records = ctx.core.store().completed()?;
    let body = export_csv(&records).map_err(|e| ApiError::Internal(e.to_string()))?;
    let file_name = export_file_name(chrono::Local::now().date_naive());

    tracing::info!(rows = records.len(), file_name = %file_name, "CSV export");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    ))
}
