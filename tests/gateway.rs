//! Tests for the authenticated request gateway.


use fixtures::{controller, expired_access, fresh_access, seed_credentials, token_pair_body};
use tokengate::{AuthError, RequestGateway};
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, serde::Deserialize)]
struct Echo {
    ok: bool,
}

#[tokio::test]
async fn gateway_attaches_bearer_token() {
    let server = MockServer::start().await;
    let access = fresh_access(1, "a");

    Mock::given(method("GET"))
        .and(path("/notes"))
        .and(header("authorization", format!("Bearer {access}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let (session, _identity, config, _dir) = controller(&server.uri());
    seed_credentials(&config, &access, "RT1");
    let gateway = RequestGateway::new(&config, session).unwrap();

    let echo: Echo = gateway.get("notes").await.unwrap();
    assert!(echo.ok);
}

#[tokio::test]
async fn gateway_renews_before_dispatch() {
    let server = MockServer::start().await;
    let renewed = fresh_access(1, "a");

    Mock::given(method("POST"))
        .and(path("/user/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_pair_body(&renewed, "RT2")))
        .expect(1)
        .mount(&server)
        .await;
    // The business call must carry the just-renewed token, not the stale one
    Mock::given(method("GET"))
        .and(path("/notes"))
        .and(header("authorization", format!("Bearer {renewed}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let (session, _identity, config, _dir) = controller(&server.uri());
    seed_credentials(&config, &expired_access(1, "a"), "RT1");
    let gateway = RequestGateway::new(&config, session).unwrap();

    let echo: Echo = gateway.get("notes").await.unwrap();
    assert!(echo.ok);
}

#[tokio::test]
async fn gateway_dispatches_anonymously_without_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/public"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/public"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
        .mount(&server)
        .await;

    let (session, _identity, config, _dir) = controller(&server.uri());
    let gateway = RequestGateway::new(&config, session).unwrap();

    let echo: Echo = gateway.get("public").await.unwrap();
    assert!(echo.ok);
}

#[tokio::test]
async fn gateway_dispatches_anonymously_after_failed_renewal() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/user/token/refresh/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "detail": "Token is invalid or expired",
        })))
        .expect(1)
        .mount(&server)
        .await;
    // The backend answers for the missing credential itself
    Mock::given(method("GET"))
        .and(path("/notes"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "detail": "Authentication credentials were not provided.",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (session, identity, config, _dir) = controller(&server.uri());
    seed_credentials(&config, &expired_access(1, "a"), "RT1");
    let gateway = RequestGateway::new(&config, std::sync::Arc::clone(&session)).unwrap();

    let err = gateway.get::<Echo>("notes").await.unwrap_err();
    assert_eq!(err.detail(), "Authentication credentials were not provided.");

    // The failed renewal logged us out
    assert_eq!(session.credentials(), None);
    assert!(!identity.is_logged_in());
}

#[tokio::test]
async fn gateway_posts_json_bodies() {
    let server = MockServer::start().await;
    let access = fresh_access(1, "a");

    Mock::given(method("POST"))
        .and(path("/notes"))
        .and(header("authorization", format!("Bearer {access}").as_str()))
        .and(wiremock::matchers::body_partial_json(serde_json::json!({
            "title": "hello",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let (session, _identity, config, _dir) = controller(&server.uri());
    seed_credentials(&config, &access, "RT1");
    let gateway = RequestGateway::new(&config, session).unwrap();

    let echo: Echo = gateway
        .post("notes", &serde_json::json!({ "title": "hello" }))
        .await
        .unwrap();
    assert!(echo.ok);
}
