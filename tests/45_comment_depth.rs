mod common;

use common::{TestDatabase, TestServer};
use reqwest::StatusCode;
use serde_json::json;

/// Replies stop at the configured depth and the thread stays readable.
#[tokio::test]
async fn replies_stop_at_configured_depth() -> anyhow::Result<()> {
    let Some(db) = TestDatabase::create().await? else {
        return Ok(());
    };
    let server = TestServer::spawn(&db.url, &[("COMMENT_MAX_DEPTH", "3")]).await?;
    let result = run_thread(&server).await;
    drop(server);
    db.drop_database().await?;
    result
}

async fn run_thread(server: &TestServer) -> anyhow::Result<()> {
    let admin = server.register("alice").await?;
    let (status, article) = server
        .post("/api/articles", Some(&admin), json!({"title": "Open thread", "body": "Talk amongst yourselves."}))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let article_id = article["data"]["id"].as_i64().unwrap();
    let (status, _) = server
        .put(&format!("/api/articles/{}/approve", article_id), Some(&admin), json!({}))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let comments = format!("/api/articles/{}/comments", article_id);
    let mut parent_id = None;
    for depth in 1..=3 {
        let (status, body) = server
            .post(&comments, Some(&admin), json!({"body": format!("level {}", depth), "parent_id": parent_id}))
            .await?;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        parent_id = body["data"]["id"].as_i64();
    }

    let (status, body) = server
        .post(&comments, Some(&admin), json!({"body": "level 4", "parent_id": parent_id}))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"], "Replies cannot nest deeper than 3 levels");

    // A sibling at the deepest level is still allowed
    let (_, thread) = server.get(&comments, None).await?;
    let second_level = thread["data"][0]["children"][0]["id"].as_i64();
    let (status, _) = server
        .post(&comments, Some(&admin), json!({"body": "level 3 again", "parent_id": second_level}))
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, thread) = server.get(&comments, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(thread["data"][0]["children"][0]["children"].as_array().map(Vec::len), Some(2));
    Ok(())
}
