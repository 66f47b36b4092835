//! Shared types for the HTTP layer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::models::report::FieldValue;

// ═══════════════════════════════════════════════════════════
// API context
// ═══════════════════════════════════════════════════════════

/// Shared context for all routes.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

// ═══════════════════════════════════════════════════════════
// Request bodies
// ═══════════════════════════════════════════════════════════

/// `PATCH /api/reports/:id`
#[derive(Debug, Deserialize)]
pub struct UpdateFieldRequest {
    /// Wire name of the field (`folio`, `materiales`, ...).
    pub field: String,
    pub value: FieldValue,
}

/// `POST /api/reports/:id/checkbox`
#[derive(Debug, Deserialize)]
pub struct ToggleCheckboxRequest {
    pub group: String,
    pub option: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchQuery {
    pub model: Option<String>,
}

// ═══════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════

/// Parse a path id, answering 400 in the API's error shape.
pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid id: {raw}")))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub deleted: Uuid,
}
