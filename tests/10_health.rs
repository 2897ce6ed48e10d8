mod common;

use common::TestServer;
use reqwest::StatusCode;

#[tokio::test]
async fn root_and_health_without_store() -> anyhow::Result<()> {
    let server = TestServer::without_store().await?;

    let (status, body) = server.get("/", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "newsdesk-api");

    let (status, body) = server.get("/health", None).await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Database unavailable");
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_not_found() -> anyhow::Result<()> {
    let server = TestServer::without_store().await?;
    let response = server.client.get(server.url("/api/nope")).send().await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}
