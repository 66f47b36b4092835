use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;
use crate::pipeline::structuring::variants::{ModelVariant, VariantProfile, VARIANT_PROFILES};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelsResponse {
    pub default: ModelVariant,
    pub variants: &'static [VariantProfile],
}

/// `GET /api/models`: the selectable extraction variants.
pub async fn list(State(ctx): State<ApiContext>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        default: ctx.core.config.default_variant,
        variants: VARIANT_PROFILES,
    })
}
