mod common;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn create_item(server: &common::TestServer, token: &str, title: &str) -> Result<i64> {
    let res = server
        .client
        .post(server.url("/data"))
        .bearer_auth(token)
        .json(&json!({ "title": title, "content": format!("{} body", title) }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "create failed: {}", res.status());
    let body: Value = res.json().await?;
    body["data"]["id"].as_i64().context("created item has no id")
}

async fn count(server: &common::TestServer, token: &str, query: &str) -> Result<usize> {
    let body: Value = server
        .client
        .get(server.url(&format!("/data{}", query)))
        .bearer_auth(token)
        .send()
        .await?
        .json()
        .await?;
    Ok(body["data"].as_array().map(Vec::len).unwrap_or_default())
}

#[tokio::test]
async fn owners_admins_and_strangers() -> Result<()> {
    let server = common::spawn_server().await?;
    let alice = server.token_for("alice", "user").await?;
    let bob = server.token_for("bob", "user").await?;
    let admin = server.token_for("admin", "admin").await?;

    let item = create_item(&server, &alice, "Alice notes").await?;
    let path = server.url(&format!("/data/{}", item));

    // Owner reads
    let res = server.client.get(&path).bearer_auth(&alice).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["title"], "Alice notes");

    // A different non-admin is forbidden, and nothing changes
    let res = server.client.get(&path).bearer_auth(&bob).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "FORBIDDEN");

    let res = server
        .client
        .put(&path)
        .bearer_auth(&bob)
        .json(&json!({ "title": "hijacked" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = server.client.delete(&path).bearer_auth(&bob).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Admin reads and edits anything
    let res = server
        .client
        .put(&path)
        .bearer_auth(&admin)
        .json(&json!({ "title": "  Reviewed  " }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["title"], "Reviewed");
    assert_eq!(body["data"]["content"], "Alice notes body");
    assert!(body["data"]["updated_at"].is_string());

    // Owner deletes; then it is gone
    let res = server.client.delete(&path).bearer_auth(&alice).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let res = server.client.get(&path).bearer_auth(&admin).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn missing_items_are_hidden_from_non_admins() -> Result<()> {
    let server = common::spawn_server().await?;
    let alice = server.token_for("alice", "user").await?;
    let admin = server.token_for("admin", "admin").await?;

    let res = server.client.get(server.url("/data/999")).bearer_auth(&alice).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.client.get(server.url("/data/999")).bearer_auth(&admin).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.client.get(server.url("/data/abc")).bearer_auth(&admin).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn listing_is_scoped_to_the_caller() -> Result<()> {
    let server = common::spawn_server().await?;
    let alice = server.token_for("alice", "user").await?;
    let bob = server.token_for("bob", "user").await?;
    let admin = server.token_for("admin", "admin").await?;

    create_item(&server, &alice, "a1").await?;
    create_item(&server, &alice, "a2").await?;
    create_item(&server, &bob, "b1").await?;

    assert_eq!(count(&server, &alice, "").await?, 2);
    assert_eq!(count(&server, &bob, "").await?, 1);
    assert_eq!(count(&server, &admin, "").await?, 3);
    assert_eq!(count(&server, &admin, "?skip=1&limit=1").await?, 1);

    let res = server
        .client
        .get(server.url("/data?limit=0"))
        .bearer_auth(&alice)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn item_input_is_validated() -> Result<()> {
    let server = common::spawn_server().await?;
    let alice = server.token_for("alice", "user").await?;

    let res = server
        .client
        .post(server.url("/data"))
        .bearer_auth(&alice)
        .json(&json!({ "title": "   ", "content": "body" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["title"].is_string());
    Ok(())
}

#[tokio::test]
async fn user_directory_is_admin_only() -> Result<()> {
    let server = common::spawn_server().await?;
    let alice = server.token_for("alice", "user").await?;
    let moderator = server.token_for("mod", "moderator").await?;
    let admin = server.token_for("admin", "admin").await?;

    for token in [&alice, &moderator] {
        let res = server.client.get(server.url("/users")).bearer_auth(token).send().await?;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    let res = server.client.get(server.url("/users")).bearer_auth(&admin).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let users = body["data"].as_array().context("users list")?;
    assert_eq!(users.len(), 3);
    assert!(users.iter().all(|u| u.get("hashed_password").is_none()));
    Ok(())
}

#[tokio::test]
async fn bootstrapped_admin_works_without_privileged_registration() -> Result<()> {
    let mut config = common::test_config();
    config.security.allow_privileged_registration = false;
    config.bootstrap.admin_username = Some("root".to_string());
    config.bootstrap.admin_password = Some("Sup3rSecret".to_string());
    let server = common::spawn_server_with(config).await?;

    assert_eq!(server.register("eve", "admin").await?.status(), StatusCode::FORBIDDEN);

    let bob = server.token_for("bob", "user").await?;
    let item = create_item(&server, &bob, "Bob notes").await?;

    let body: Value = server.login("root", "Sup3rSecret").await?.json().await?;
    let admin = body["data"]["access_token"].as_str().context("admin login")?.to_string();

    let res = server
        .client
        .get(server.url(&format!("/data/{}", item)))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.client.get(server.url("/users")).bearer_auth(&admin).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    Ok(())
}
