mod common;

use axum::http::StatusCode;
use color_eyre::Result;
use common::TestContext;

#[tokio::test]
async fn test_health_endpoint() -> Result<()> {
    // ARRANGE
    let context = TestContext::new().await?;

    // ACT
    let (root_status, root) = context.get("/health", None).await?;
    let (api_status, api) = context.get("/api/health", None).await?;

    // ASSERT
    assert_eq!(root_status, StatusCode::OK);
    assert_eq!(root["success"], true);
    assert_eq!(root["message"], "EcoSnap API is running");
    assert!(root["timestamp"].is_string());
    assert_eq!(api_status, StatusCode::OK);
    assert_eq!(api["success"], true);

    Ok(())
}

#[tokio::test]
async fn test_root_lists_endpoints() -> Result<()> {
    // ARRANGE
    let context = TestContext::new().await?;

    // ACT
    let (status, body) = context.get("/", None).await?;

    // ASSERT
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoints"]["reports"], "/api/reports");
    assert_eq!(body["endpoints"]["auth"], "/api/auth");

    Ok(())
}

#[tokio::test]
async fn test_unknown_route() -> Result<()> {
    // ARRANGE
    let context = TestContext::new().await?;

    // ACT
    let (status, body) = context.get("/api/nope", None).await?;

    // ASSERT
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Route /api/nope not found");

    Ok(())
}

#[tokio::test]
async fn test_openapi_document() -> Result<()> {
    // ARRANGE
    let context = TestContext::new().await?;

    // ACT
    let (status, body) = context.get("/openapi.json", None).await?;

    // ASSERT
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/reports/{id}"].is_object());
    assert!(body["components"]["securitySchemes"]["bearer_auth"].is_object());

    Ok(())
}
