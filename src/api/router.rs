//! HTTP router.
//!
//! Returns a composable `Router` with every route nested under `/api/`.
//!
//! Layers (outermost → innermost): trace → CORS → `Cache-Control: no-store`
//! → body limit.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router over shared state.
pub fn api_router(core: Arc<CoreState>) -> Router {
    let body_limit = core.config.max_upload_bytes;
    let ctx = ApiContext::new(core);

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/models", get(endpoints::models::list))
        .route("/batches", post(endpoints::batches::submit))
        .route("/batches/:id", get(endpoints::batches::progress))
        .route("/reports", get(endpoints::reports::list))
        .route(
            "/reports/:id",
            get(endpoints::reports::detail)
                .patch(endpoints::reports::update_field)
                .delete(endpoints::reports::delete),
        )
        .route(
            "/reports/:id/checkbox",
            post(endpoints::reports::toggle_checkbox),
        )
        .route("/reports/:id/source", get(endpoints::reports::source))
        .route("/export.csv", get(endpoints::export::csv))
        .with_state(ctx);

    Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
