use crate::api_state::ApiContext;
use crate::create_router;
use app_state::AppSettings;
use axum::Router;
use axum::response::{IntoResponse, Response};
use color_eyre::Result;
use color_eyre::eyre::eyre;
use common_services::api::auth::service::seed_demo_users;
use http::{HeaderValue, StatusCode, header};
use serde_json::json;
use std::any::Any;
use std::iter::once;
use std::net::SocketAddr;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors;
use tower_http::cors::CorsLayer;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// The full application: JSON routes, uploaded images and the HTTP middleware stack.
pub fn build_app(api_state: ApiContext) -> Router {
    let settings = api_state.settings.clone();

    // --- CORS Configuration ---
    let allowed_origins: Vec<HeaderValue> = settings
        .api
        .allowed_origins
        .iter()
        .filter_map(|s| match s.parse() {
            Ok(hv) => Some(hv),
            Err(e) => {
                error!("Invalid CORS origin configured: {} - Error: {}", s, e);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_methods(cors::Any)
        .allow_origin(allowed_origins)
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
            header::USER_AGENT,
            header::CACHE_CONTROL,
            header::PRAGMA,
        ]);

    // Uploaded report images
    let serve_dir = ServeDir::new(&settings.storage.upload_folder);

    create_router(api_state)
        .nest_service("/uploads", serve_dir)
        .layer(TraceLayer::new_for_http().on_request(()))
        .layer(cors)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(SetSensitiveRequestHeadersLayer::new(once(
            header::AUTHORIZATION,
        )))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Request handler panicked: {}", detail);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        axum::Json(json!({ "success": false, "message": "Server error" })),
    )
        .into_response()
}

pub async fn serve(settings: AppSettings) -> Result<()> {
    // --- Server Startup ---
    info!("🚀 Initializing server...");
    let api_state = ApiContext::from_settings(settings.clone()).await?;

    if settings.seed_demo_users {
        seed_demo_users(api_state.users.as_ref()).await?;
    }

    let app = build_app(api_state);

    let addr: SocketAddr = format!("{}:{}", settings.api.host, settings.api.port)
        .parse()
        .map_err(|e| eyre!("Invalid address: {}", e))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("🌱 Server listening on http://{}", addr);
    info!("API docs at {}/openapi.json", settings.api.public_url);

    axum::serve(listener, app).await?;
    Ok(())
}
