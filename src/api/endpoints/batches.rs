//! Batch upload and progress.
//!
//! `POST /api/batches` creates one `processing` record per uploaded file
//! before answering, then runs the batch on a blocking worker thread.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{parse_id, ApiContext, BatchQuery};
use crate::pipeline::batch::{BatchProgress, BatchTicket};
use crate::pipeline::import::encode::BatchFile;
use crate::pipeline::import::format::sanitize_filename;
use crate::pipeline::structuring::variants::ModelVariant;

/// Multipart part names accepted as documents.
const FILE_FIELDS: &[&str] = &["file", "files"];

/// `POST /api/batches?model=flash|pro`
pub async fn submit(
    State(ctx): State<ApiContext>,
    Query(query): Query<BatchQuery>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<BatchTicket>), ApiError> {
    let variant = match query.model.as_deref() {
        Some(raw) => raw.parse::<ModelVariant>().map_err(ApiError::BadRequest)?,
        None => ctx.core.config.default_variant,
    };

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        if !FILE_FIELDS.contains(&name.as_str()) {
            continue;
        }
        let filename = sanitize_filename(field.file_name().unwrap_or("document"));
        let declared = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read '{filename}': {e}")))?;
        files.push(BatchFile::from_bytes(&filename, declared.as_deref(), bytes.to_vec()));
    }

    if files.is_empty() {
        return Err(ApiError::BadRequest("No files in upload".into()));
    }

    let core = ctx.core.clone();
    let ticket = core.runner().intake(core.store(), &files)?;
    core.register_batch(&ticket, variant)?;

    let worker_ticket = ticket.clone();
    tokio::task::spawn_blocking(move || {
        let batch_id = worker_ticket.batch_id;
        let on_event = |event: crate::pipeline::batch::BatchStatusEvent| {
            if let Err(e) = core.record_event(batch_id, &event) {
                tracing::error!(batch_id = %batch_id, error = %e, "Could not record batch progress");
            }
        };
        core.runner()
            .process(core.store(), &worker_ticket, &files, variant, Some(&on_event));
    });

    Ok((StatusCode::ACCEPTED, Json(ticket)))
}

/// `GET /api/batches/:id`
pub async fn progress(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<BatchProgress>, ApiError> {
    let id = parse_id(&id)?;
    ctx.core
        .batch_progress(id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Batch not found: {id}")))
}
