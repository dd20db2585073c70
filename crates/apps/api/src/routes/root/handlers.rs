use crate::api_state::ApiContext;
use crate::routes::api_doc::ApiDoc;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Value, json};
use tracing::error;
use utoipa::OpenApi;

#[utoipa::path(
    get,
    path = "/",
    tag = "System",
    responses(
        (status = 200, description = "Welcome message with an endpoint map")
    )
)]
pub async fn root(State(context): State<ApiContext>) -> Json<Value> {
    let base = context.settings.api.route_prefix();
    Json(json!({
        "success": true,
        "message": "Welcome to EcoSnap API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": format!("{base}/health"),
            "auth": format!("{base}/auth"),
            "reports": format!("{base}/reports"),
            "uploads": "/uploads",
            "openapi": "/openapi.json",
        },
    }))
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    responses(
        (status = 200, description = "API is healthy and ready to accept traffic"),
        (status = 503, description = "API is not healthy, likely due to a database issue.")
    )
)]
pub async fn health_check(
    State(context): State<ApiContext>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match context.reports.ping().await {
        Ok(()) => Ok(Json(json!({
            "success": true,
            "message": "EcoSnap API is running",
            "timestamp": chrono::Utc::now(),
        }))),
        Err(e) => {
            error!("Health check failed: store unreachable: {}", e);
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "success": false, "message": "Database unavailable" })),
            ))
        }
    }
}

#[utoipa::path(
    get,
    path = "/openapi.json",
    tag = "System",
    responses(
        (status = 200, description = "The OpenAPI document of this server")
    )
)]
pub async fn openapi_document() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
