mod common;

use common::{TestDatabase, TestServer};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn org_chart_stays_a_forest() -> anyhow::Result<()> {
    let Some(db) = TestDatabase::create().await? else {
        return Ok(());
    };
    let server = TestServer::spawn(&db.url, &[]).await?;
    let result = run(&server).await;
    drop(server);
    db.drop_database().await?;
    result
}

async fn run(server: &TestServer) -> anyhow::Result<()> {
    let admin = server.register("chief").await?;

    let (status, pm) = server
        .post("/api/org/positions", Some(&admin), json!({"title": "Prime Minister", "occupant_name": "Jane Doe"}))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(pm["data"]["is_vacant"], false);
    let pm_id = pm["data"]["id"].as_i64().unwrap();

    let (_, finance) = server
        .post(
            "/api/org/positions",
            Some(&admin),
            json!({"title": "Minister of Finance", "parent_id": pm_id, "sort_order": 2}),
        )
        .await?;
    assert_eq!(finance["data"]["is_vacant"], true);
    let finance_id = finance["data"]["id"].as_i64().unwrap();

    let (_, health) = server
        .post(
            "/api/org/positions",
            Some(&admin),
            json!({"title": "Minister of Health", "parent_id": pm_id, "sort_order": 1}),
        )
        .await?;
    let health_id = health["data"]["id"].as_i64().unwrap();

    let (status, _) = server
        .post("/api/org/positions", Some(&admin), json!({"title": "Orphan", "parent_id": 424242}))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Siblings come back in sort order
    let (_, tree) = server.get("/api/org/tree", None).await?;
    assert_eq!(tree["data"][0]["id"], pm_id);
    assert_eq!(tree["data"][0]["children"][0]["id"], health_id);
    assert_eq!(tree["data"][0]["children"][1]["id"], finance_id);

    // Moving a node under its own descendant would close a cycle
    let (status, body) = server
        .put(&format!("/api/org/positions/{}", pm_id), Some(&admin), json!({"parent_id": finance_id}))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    let (status, _) = server
        .put(&format!("/api/org/positions/{}", pm_id), Some(&admin), json!({"parent_id": pm_id}))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Re-parenting sideways is fine
    let (status, moved) = server
        .put(&format!("/api/org/positions/{}", finance_id), Some(&admin), json!({"parent_id": health_id}))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["data"]["parent_id"], health_id);

    // A position with reports cannot be removed
    let (status, _) = server.delete(&format!("/api/org/positions/{}", pm_id), Some(&admin)).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = server
        .delete(&format!("/api/org/positions/{}", finance_id), Some(&admin))
        .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, positions) = server.get("/api/org/positions", None).await?;
    assert_eq!(positions["data"].as_array().map(Vec::len), Some(2));
    Ok(())
}
