//! Report review endpoints: read, correct, toggle, delete, preview.
//!
//! Every operation is addressed by record id; a batch still running on
//! other records is never affected.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{parse_id, ApiContext, DeletedResponse, ToggleCheckboxRequest, UpdateFieldRequest};
use crate::models::report::DocumentRecord;
use crate::pipeline::import::encode::decode_data_url;
use crate::pipeline::structuring::checkbox::CheckboxGroup;

/// `GET /api/reports`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<DocumentRecord>>, ApiError> {
    Ok(Json(ctx.core.store().list()?))
}

/// `GET /api/reports/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<DocumentRecord>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(ctx.core.store().get(id)?))
}

/// `PATCH /api/reports/:id` with `{ "field", "value" }`
pub async fn update_field(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Json(body): Json<UpdateFieldRequest>,
) -> Result<Json<DocumentRecord>, ApiError> {
    let id = parse_id(&id)?;
    let record = ctx
        .core
        .store()
        .update_named_field(id, &body.field, body.value)?;
    tracing::debug!(record_id = %id, field = %body.field, "Field updated");
    Ok(Json(record))
}

/// `POST /api/reports/:id/checkbox` with `{ "group", "option" }`
pub async fn toggle_checkbox(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Json(body): Json<ToggleCheckboxRequest>,
) -> Result<Json<DocumentRecord>, ApiError> {
    let id = parse_id(&id)?;
    let group = CheckboxGroup::from_wire_name(&body.group)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown checkbox group: {}", body.group)))?;
    Ok(Json(ctx.core.store().toggle_checkbox(id, group, &body.option)?))
}

/// `DELETE /api/reports/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let id = parse_id(&id)?;
    let removed = ctx.core.store().delete(id)?;
    tracing::info!(record_id = %removed.id, status = removed.status.as_str(), "Record deleted");
    Ok(Json(DeletedResponse { deleted: removed.id }))
}

/// `GET /api/reports/:id/source`: the original upload bytes.
pub async fn source(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let record = ctx.core.store().get(id)?;
    let data_url = record
        .source_image
        .ok_or_else(|| ApiError::NotFound(format!("No source image for {id}")))?;
    let (media_type, bytes) =
        decode_data_url(&data_url).map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, media_type)], bytes))
}
