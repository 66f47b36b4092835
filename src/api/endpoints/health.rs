//! Liveness endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// False means every extraction will fail until a key is configured.
    pub api_key_configured: bool,
    pub records: usize,
    pub active_batches: usize,
}

/// `GET /api/health`
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    Ok(Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        api_key_configured: ctx.core.config.api_key.is_some(),
        records: ctx.core.store().len()?,
        active_batches: ctx.core.active_batches()?,
    }))
}
