//! Token issuance, token resolution, and the health endpoints.

#![allow(clippy::unwrap_used)]

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Duration;
use serde_json::json;

use dscommerce_integration_tests::{ALEX, MARIA, PASSWORD, TestApp};

fn token_request(form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/oauth2/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_owned()))
        .unwrap()
}

#[tokio::test]
async fn test_password_grant_issues_usable_token() {
    let app = TestApp::seeded();

    let res = app
        .send(token_request(&format!(
            "grant_type=password&username=maria%40gmail.com&password={PASSWORD}"
        )))
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["token_type"], "Bearer");
    assert_eq!(res.body["expires_in"], 86_400);
    assert_eq!(res.headers[header::CACHE_CONTROL], "no-store");

    let token = res.body["access_token"].as_str().unwrap();
    let me = app.get("/users/me", Some(token)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["email"], MARIA);
}

#[tokio::test]
async fn test_username_is_matched_case_insensitively() {
    let app = TestApp::seeded();

    let res = app
        .send(token_request(&format!(
            "grant_type=password&username=Maria%40Gmail.com&password={PASSWORD}"
        )))
        .await;

    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let app = TestApp::seeded();

    let res = app
        .send(token_request(
            "grant_type=password&username=maria%40gmail.com&password=654321",
        ))
        .await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["message"], "Bad credentials");
}

#[tokio::test]
async fn test_unknown_user_is_unauthorized() {
    let app = TestApp::seeded();

    let res = app
        .send(token_request(&format!(
            "grant_type=password&username=nobody%40gmail.com&password={PASSWORD}"
        )))
        .await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_other_grant_types_are_bad_request() {
    let app = TestApp::seeded();

    let res = app
        .send(token_request(
            "grant_type=client_credentials&username=maria%40gmail.com&password=x",
        ))
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_incomplete_form_is_bad_request() {
    let app = TestApp::seeded();

    let res = app.send(token_request("grant_type=password")).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["path"], "/oauth2/token");
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let app = TestApp::seeded();
    let token = app.shop.issue_token(MARIA, Duration::seconds(-1)).unwrap();

    let res = app.get("/users/me", Some(&token)).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_removes_expired_tokens() {
    let app = TestApp::seeded();
    let expired = app.shop.issue_token(ALEX, Duration::seconds(-1)).unwrap();
    let live = app.token(MARIA);
    assert_eq!(app.shop.token_count(), 2);

    let res = app
        .send(token_request(&format!(
            "grant_type=password&username=maria%40gmail.com&password={PASSWORD}"
        )))
        .await;
    assert_eq!(res.status, StatusCode::OK);

    assert_eq!(app.shop.token_count(), 2);
    assert_eq!(app.get("/users/me", Some(&expired)).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.get("/users/me", Some(&live)).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_me_lists_authorities() {
    let app = TestApp::seeded();
    let token = app.token(ALEX);

    let res = app.get("/users/me", Some(&token)).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["name"], "Alex Green");
    assert_eq!(res.body["roles"], json!(["ROLE_CLIENT", "ROLE_ADMIN"]));
    assert!(res.body.get("password").is_none());
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::seeded();

    let live = app
        .send(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.body, "ok");
    assert!(live.headers.contains_key("x-request-id"));

    let ready = app
        .send(
            Request::builder()
                .uri("/health/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(ready.status, StatusCode::OK);
}
