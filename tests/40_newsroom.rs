mod common;

use common::{TestDatabase, TestServer};
use reqwest::StatusCode;
use serde_json::json;

/// Full editorial flow against a throwaway Postgres database.
///
/// Skipped unless DATABASE_URL points at a server where the test user may create databases.
#[tokio::test]
async fn editorial_workflow() -> anyhow::Result<()> {
    let Some(db) = TestDatabase::create().await? else {
        return Ok(());
    };
    let server = TestServer::spawn(&db.url, &[]).await?;
    let result = run_workflow(&server).await;
    drop(server);
    db.drop_database().await?;
    result
}

async fn run_workflow(server: &TestServer) -> anyhow::Result<()> {
    let (status, _) = server.get("/health", None).await?;
    assert_eq!(status, StatusCode::OK);

    // First account on a fresh install is the admin
    let admin = server.register("alice").await?;
    let (_, me) = server.get("/api/auth/me", Some(&admin)).await?;
    assert_eq!(me["data"]["role"], "admin");
    let admin_id = me["data"]["id"].as_i64().unwrap();

    let reader = server.register("bob").await?;
    let (_, me) = server.get("/api/auth/me", Some(&reader)).await?;
    assert_eq!(me["data"]["role"], "user");

    // Duplicate usernames conflict
    let (status, _) = server
        .post("/api/auth/register", None, json!({"username": "bob", "password": "another password"}))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // Promote carol; the new role applies from her next login
    server.register("carol").await?;
    let (_, users) = server.get("/api/admin/users", Some(&admin)).await?;
    let carol_id = users["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["username"] == "carol")
        .and_then(|u| u["id"].as_i64())
        .unwrap();
    let (status, body) = server
        .put(&format!("/api/admin/users/{}/role", carol_id), Some(&admin), json!({"role": "editor"}))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let editor = server.login("carol").await?;

    // The last admin cannot step down
    let (status, _) = server
        .put(&format!("/api/admin/users/{}/role", admin_id), Some(&admin), json!({"role": "user"}))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // Categories
    let (status, category) = server
        .post("/api/categories", Some(&editor), json!({"name": "World News"}))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(category["data"]["slug"], "world-news");
    let category_id = category["data"]["id"].as_i64().unwrap();
    let (status, _) = server
        .post("/api/categories", Some(&editor), json!({"name": "World  news"}))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // Articles start pending and stay out of public listings
    let (status, first) = server
        .post(
            "/api/articles",
            Some(&editor),
            json!({"title": "Budget passes", "body": "Parliament approved the budget.", "category_id": category_id}),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["data"]["status"], "pending");
    assert_eq!(first["data"]["slug"], "budget-passes");
    let first_id = first["data"]["id"].as_i64().unwrap();

    let (_, second) = server
        .post("/api/articles", Some(&editor), json!({"title": "Budget passes", "body": "Follow-up coverage."}))
        .await?;
    assert_eq!(second["data"]["slug"], "budget-passes-2");
    let second_id = second["data"]["id"].as_i64().unwrap();

    let (_, listing) = server.get("/api/articles", None).await?;
    assert_eq!(listing["data"]["total"], 0);
    let (status, _) = server.get(&format!("/api/articles/{}", first_id), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Only admins approve
    let approve = |id: i64| format!("/api/articles/{}/approve", id);
    let (status, _) = server.put(&approve(first_id), Some(&editor), json!({})).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    for id in [first_id, second_id] {
        let (status, body) = server.put(&approve(id), Some(&admin), json!({})).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "approved");
    }

    let (_, listing) = server.get("/api/articles?category=world-news", None).await?;
    assert_eq!(listing["data"]["total"], 1);
    let (_, found) = server.get("/api/articles?q=parliament", None).await?;
    assert_eq!(found["data"]["items"][0]["id"], first_id);

    // Each public read counts as a view
    server.get(&format!("/api/articles/{}", first_id), None).await?;
    let (_, shown) = server.get(&format!("/api/articles/{}", first_id), None).await?;
    assert_eq!(shown["data"]["views"], 2);
    let (_, popular) = server.get("/api/articles/popular", None).await?;
    assert_eq!(popular["data"][0]["id"], first_id);

    // Featuring moves the flag, there is never more than one
    let feature = |id: i64| format!("/api/articles/{}/feature", id);
    server.put(&feature(first_id), Some(&editor), json!({})).await?;
    let (status, _) = server.put(&feature(second_id), Some(&editor), json!({})).await?;
    assert_eq!(status, StatusCode::OK);
    let (_, featured) = server.get("/api/articles/featured", None).await?;
    assert_eq!(featured["data"]["id"], second_id);
    let (_, shown) = server.get(&format!("/api/articles/{}", first_id), None).await?;
    assert_eq!(shown["data"]["featured"], false);

    // Featuring a missing article leaves the current one in place
    let (status, _) = server.put(&feature(999999), Some(&editor), json!({})).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, featured) = server.get("/api/articles/featured", None).await?;
    assert_eq!(featured["data"]["id"], second_id);

    // Threaded comments
    let comments = format!("/api/articles/{}/comments", first_id);
    let (status, root) = server.post(&comments, Some(&reader), json!({"body": "Finally."})).await?;
    assert_eq!(status, StatusCode::CREATED);
    let root_id = root["data"]["id"].as_i64().unwrap();
    let (status, _) = server
        .post(&comments, Some(&editor), json!({"body": "Indeed.", "parent_id": root_id}))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = server
        .post(
            &format!("/api/articles/{}/comments", second_id),
            Some(&reader),
            json!({"body": "Wrong thread", "parent_id": root_id}),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, thread) = server.get(&comments, None).await?;
    assert_eq!(thread["data"][0]["id"], root_id);
    assert_eq!(thread["data"][0]["author_username"], "bob");
    assert_eq!(thread["data"][0]["children"][0]["body"], "Indeed.");

    // Another user may not delete bob's comment, an editor may
    let dave = server.register("dave").await?;
    let (status, _) = server.delete(&format!("/api/comments/{}", root_id), Some(&dave)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Votes toggle on repeat
    let vote = json!({"target": "article", "target_id": first_id, "value": 1});
    let (_, tally) = server.post("/api/votes", Some(&reader), vote.clone()).await?;
    assert_eq!(tally["data"]["score"], 1);
    assert_eq!(tally["data"]["mine"], 1);
    let (_, tally) = server
        .post("/api/votes", Some(&dave), json!({"target": "article", "target_id": first_id, "value": -1}))
        .await?;
    assert_eq!(tally["data"]["up"], 1);
    assert_eq!(tally["data"]["down"], 1);
    let (_, tally) = server.post("/api/votes", Some(&reader), vote).await?;
    assert_eq!(tally["data"]["score"], -1);
    assert!(tally["data"]["mine"].is_null());
    let (status, _) = server
        .post("/api/votes", Some(&reader), json!({"target": "comment", "target_id": 999999, "value": 1}))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The same first vote sent twice at once counts once, then withdraws
    let eve = server.register("eve").await?;
    let vote = json!({"target": "article", "target_id": second_id, "value": 1});
    let (a, b) = tokio::join!(
        server.post("/api/votes", Some(&eve), vote.clone()),
        server.post("/api/votes", Some(&eve), vote.clone()),
    );
    assert_eq!(a?.0, StatusCode::OK);
    assert_eq!(b?.0, StatusCode::OK);
    let (_, tally) = server.get(&format!("/api/votes/article/{}", second_id), Some(&eve)).await?;
    assert_eq!(tally["data"]["score"], 0);
    assert!(tally["data"]["mine"].is_null());

    let (status, _) = server.delete(&format!("/api/comments/{}", root_id), Some(&editor)).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, thread) = server.get(&comments, None).await?;
    assert_eq!(thread["data"], json!([]));

    // Deleting a commenter removes their threads and every vote cast on them
    let frank = server.register("frank").await?;
    let (_, me) = server.get("/api/auth/me", Some(&frank)).await?;
    let frank_id = me["data"]["id"].as_i64().unwrap();
    let (_, top) = server.post(&comments, Some(&frank), json!({"body": "First!"})).await?;
    let top_id = top["data"]["id"].as_i64().unwrap();
    let (_, reply) = server
        .post(&comments, Some(&dave), json!({"body": "Not quite.", "parent_id": top_id}))
        .await?;
    let reply_id = reply["data"]["id"].as_i64().unwrap();
    for (voter, target_id) in [(&dave, top_id), (&editor, top_id), (&editor, reply_id), (&frank, reply_id)] {
        let (status, _) = server
            .post("/api/votes", Some(voter.as_str()), json!({"target": "comment", "target_id": target_id, "value": 1}))
            .await?;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = server.delete(&format!("/api/admin/users/{}", frank_id), Some(&admin)).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    for target_id in [top_id, reply_id] {
        let (_, tally) = server.get(&format!("/api/votes/comment/{}", target_id), Some(&dave)).await?;
        assert_eq!(tally["data"]["up"], 0);
        assert_eq!(tally["data"]["down"], 0);
        assert_eq!(tally["data"]["score"], 0);
    }
    let (_, thread) = server.get(&comments, None).await?;
    assert_eq!(thread["data"], json!([]));

    // Deleting a category detaches its articles
    let (status, _) = server
        .delete(&format!("/api/categories/{}", category_id), Some(&editor))
        .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, shown) = server.get(&format!("/api/articles/{}", first_id), None).await?;
    assert!(shown["data"]["category_id"].is_null());

    Ok(())
}
