mod api_doc;
pub mod auth;
pub mod extractors;
pub mod reports;
pub mod response;
pub mod root;

use crate::api_state::ApiContext;
use crate::auth::middlewares::user::ApiUser;
use crate::auth::router::{auth_protected_router, auth_public_router};
use crate::reports::router::reports_protected_router;
use crate::root::router::{api_public_router, root_public_router};
use axum::Router;
use axum::http::{StatusCode, Uri};
use axum::middleware::from_extractor_with_state;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

pub use api_doc::ApiDoc;

// --- Router Construction ---
pub fn create_router(api_state: ApiContext) -> Router {
    let base_path = api_state.settings.api.route_prefix();
    let api = Router::new()
        .merge(auth_public_router())
        .merge(protected_routes(api_state.clone()));

    let router = if base_path.is_empty() {
        Router::new().merge(api)
    } else {
        Router::new().nest(&base_path, api.merge(api_public_router()))
    };

    router
        .merge(root_public_router())
        .fallback(route_not_found)
        .with_state(api_state)
}

fn protected_routes(api_state: ApiContext) -> Router<ApiContext> {
    let max_upload_bytes = api_state.settings.storage.max_upload_bytes;
    Router::new()
        .merge(auth_protected_router())
        .merge(reports_protected_router(max_upload_bytes))
        .route_layer(from_extractor_with_state::<ApiUser, ApiContext>(api_state))
}

async fn route_not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "message": format!("Route {} not found", uri.path()) })),
    )
}
