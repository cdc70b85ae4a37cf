mod common;

use std::time::Duration;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn create_share(ttl_secs: i64) -> Result<Value> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .post(server.url("/api/share"))
        .bearer_auth(common::jwt()?)
        .json(&json!({ "ttl_secs": ttl_secs }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = res.json::<Value>().await?;
    Ok(body["data"].clone())
}

#[tokio::test]
async fn share_link_resolves_without_jwt() -> Result<()> {
    let server = common::ensure_server().await?;
    let created = create_share(3600).await?;

    let token = created["token"].as_str().unwrap_or_default();
    assert_eq!(token.len(), 64);
    assert_eq!(created["url"], server.url(&format!("/public/share/{}", token)));

    let res = reqwest::get(server.url(&format!("/public/share/{}", token))).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["statistics"]["total_employees"], 3);
    assert_eq!(body["data"]["expires_at"], created["expires_at"]);

    let res = reqwest::Client::new()
        .post(server.url(&format!("/public/share/{}/layout", token)))
        .json(&json!({ "expand_all": true }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["nodes"].as_array().map(Vec::len), Some(3));
    Ok(())
}

#[tokio::test]
async fn revoked_link_is_not_found() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let created = create_share(3600).await?;
    let token = created["token"].as_str().unwrap_or_default().to_string();

    for _ in 0..2 {
        let res = client
            .delete(server.url(&format!("/api/share/{}", token)))
            .bearer_auth(common::jwt()?)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
    }

    let res = reqwest::get(server.url(&format!("/public/share/{}", token))).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn zero_ttl_link_expires() -> Result<()> {
    let server = common::ensure_server().await?;
    let created = create_share(0).await?;
    let token = created["token"].as_str().unwrap_or_default().to_string();

    tokio::time::sleep(Duration::from_millis(20)).await;

    let res = reqwest::get(server.url(&format!("/public/share/{}", token))).await?;
    assert_eq!(res.status(), StatusCode::GONE);
    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "SHARE_EXPIRED");
    Ok(())
}

#[tokio::test]
async fn creating_a_share_requires_jwt() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new().post(server.url("/api/share")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn malformed_share_body_is_bad_request() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/api/share"))
        .bearer_auth(common::jwt()?)
        .json(&json!({ "ttl_secs": "soon" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], "BAD_REQUEST");

    // No body at all falls back to the default TTL.
    let res = client
        .post(server.url("/api/share"))
        .bearer_auth(common::jwt()?)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    Ok(())
}
