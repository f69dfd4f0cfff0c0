mod common;

use anyhow::Result;
use reqwest::{header, StatusCode};
use serde_json::{json, Value};

use common::PASSWORD;

#[tokio::test]
async fn register_login_and_me() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server.register("Alice", "user").await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["user_type"], "user");
    assert!(body["data"].get("hashed_password").is_none());

    let res = server.login("alice", PASSWORD).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["token_type"], "bearer");
    assert_eq!(body["data"]["expires_in"], 1800);
    let token = body["data"]["access_token"].as_str().unwrap_or_default().to_string();

    let me: Value = server
        .client
        .get(server.url("/me"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(me["data"]["username"], "alice");
    assert_eq!(me["data"]["email"], "alice@example.com");
    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_user_look_the_same() -> Result<()> {
    let server = common::spawn_server().await?;
    server.register("alice", "user").await?;

    let wrong = server.login("alice", "Wrong1234").await?;
    let unknown = server.login("mallory", PASSWORD).await?;

    for res in [wrong, unknown] {
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");
        let body: Value = res.json().await?;
        assert_eq!(body["error"], "INVALID_CREDENTIALS");
        assert_eq!(body["message"], "Incorrect username or password");
    }
    Ok(())
}

#[tokio::test]
async fn registration_validation() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server
        .client
        .post(server.url("/register"))
        .json(&json!({
            "username": "x",
            "email": "not-an-email",
            "password": "weak",
            "user_type": "superuser",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "VALIDATION_ERROR");
    for field in ["username", "email", "password", "user_type"] {
        assert!(body["field_errors"][field].is_string(), "missing error for {}", field);
    }

    assert_eq!(server.register("bob", "user").await?.status(), StatusCode::CREATED);
    let dup = server.register("BOB", "user").await?;
    assert_eq!(dup.status(), StatusCode::BAD_REQUEST);

    let res = server
        .client
        .post(server.url("/register"))
        .header(header::CONTENT_TYPE, "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn privileged_registration_can_be_disabled() -> Result<()> {
    let mut config = common::test_config();
    config.security.allow_privileged_registration = false;
    let server = common::spawn_server_with(config).await?;

    let res = server.register("root", "admin").await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "FORBIDDEN");

    assert_eq!(server.register("plain", "user").await?.status(), StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn bad_bearer_tokens_are_rejected() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.token_for("alice", "user").await?;

    let (head, signature) = token.rsplit_once('.').expect("jwt has three segments");
    let flipped = if signature.starts_with('A') { "B" } else { "A" };
    let tampered = format!("{}.{}{}", head, flipped, &signature[1..]);

    let cases = [
        None,
        Some("Basic YWxpY2U6c2VjcmV0".to_string()),
        Some("Bearer".to_string()),
        Some("Bearer not.a.jwt".to_string()),
        Some(format!("Bearer {}", tampered)),
    ];

    for auth in cases {
        let mut req = server.client.get(server.url("/me"));
        if let Some(value) = &auth {
            req = req.header(header::AUTHORIZATION, value);
        }
        let res = req.send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{:?}", auth);
        assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");
        let body: Value = res.json().await?;
        assert_eq!(body["error"], "TOKEN_MALFORMED");
    }
    Ok(())
}

#[tokio::test]
async fn tokens_expire_with_the_clock() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.token_for("alice", "user").await?;

    server.clock.advance(chrono::Duration::minutes(29));
    let res = server.client.get(server.url("/me")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    server.clock.advance(chrono::Duration::minutes(1));
    let res = server.client.get(server.url("/me")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "TOKEN_EXPIRED");
    Ok(())
}
