use crate::api_state::ApiContext;
use crate::root::handlers::{health_check, openapi_document, root};
use axum::{Router, routing::get};

/// Routes that live at the server root regardless of the API base path.
pub fn root_public_router() -> Router<ApiContext> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/openapi.json", get(openapi_document))
}

/// Routes mounted under the API base path next to auth and reports.
pub fn api_public_router() -> Router<ApiContext> {
    Router::new().route("/health", get(health_check))
}
