use std::net::SocketAddr;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, RawQuery};
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::IntoResponse;
use axum::routing::{any, get};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use gplus_dashboard::http_client::proxy_client;
use gplus_dashboard::observe::noop;
use gplus_dashboard::proxy::{ProxyState, router};

async fn spawn(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Stand-in for the stats API: echoes what it received.
fn upstream() -> Router {
    Router::new()
        .route(
            "/api/v1/:league/teams",
            get(|Path(league): Path<String>, RawQuery(query): RawQuery, headers: HeaderMap| async move {
                let host = headers
                    .get(header::HOST)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                (
                    [("x-upstream", "asa")],
                    axum::Json(json!({ "league": league, "query": query, "host": host })),
                )
            }),
        )
        .route(
            "/api/v1/mls/missing",
            get(|| async { (StatusCode::NOT_FOUND, "no such thing").into_response() }),
        )
        .route("/api/v1/", get(|| async { "api root" }))
        .route(
            "/api/v1/echo/*rest",
            any(|method: Method, uri: Uri, body: Bytes| async move {
                axum::Json(json!({
                    "method": method.as_str(),
                    "uri": uri.to_string(),
                    "body": String::from_utf8_lossy(&body),
                }))
            }),
        )
}

async fn spawn_proxy(upstream_base: &str) -> SocketAddr {
    let state = ProxyState::new(upstream_base, proxy_client().unwrap(), noop()).unwrap();
    spawn(router(state)).await
}

#[tokio::test]
async fn forwards_path_query_and_headers() {
    let upstream_addr = spawn(upstream()).await;
    let proxy_addr = spawn_proxy(&format!("http://{upstream_addr}/")).await;

    let resp = reqwest::get(format!(
        "http://{proxy_addr}/api/nwsl/teams?season_name=2024&minimum_minutes=500"
    ))
    .await
    .unwrap();

    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(
        resp.headers().get("x-upstream").and_then(|v| v.to_str().ok()),
        Some("asa")
    );
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["league"], "nwsl");
    assert_eq!(body["query"], "season_name=2024&minimum_minutes=500");
    assert_eq!(body["host"], upstream_addr.to_string());
}

#[tokio::test]
async fn upstream_errors_pass_through() {
    let upstream_addr = spawn(upstream()).await;
    let proxy_addr = spawn_proxy(&format!("http://{upstream_addr}")).await;

    let resp = reqwest::get(format!("http://{proxy_addr}/api/mls/missing"))
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    assert_eq!(resp.text().await.unwrap(), "no such thing");
}

#[tokio::test]
async fn unreachable_upstream_is_a_json_500() {
    let dead = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = dead.local_addr().unwrap();
    drop(dead);
    let proxy_addr = spawn_proxy(&format!("http://{dead_addr}")).await;

    let resp = reqwest::get(format!("http://{proxy_addr}/api/mls/teams"))
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Proxy error");
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn paths_outside_api_are_not_proxied() {
    let upstream_addr = spawn(upstream()).await;
    let proxy_addr = spawn_proxy(&format!("http://{upstream_addr}")).await;

    let resp = reqwest::get(format!("http://{proxy_addr}/index.html"))
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn methods_and_bodies_are_forwarded_verbatim() {
    let upstream_addr = spawn(upstream()).await;
    let proxy_addr = spawn_proxy(&format!("http://{upstream_addr}")).await;
    let client = reqwest::Client::new();

    for (method, body) in [
        (reqwest::Method::POST, r#"{"player_id":["a","b"]}"#),
        (reqwest::Method::PUT, "season_name=2025&x=1"),
        (reqwest::Method::DELETE, ""),
    ] {
        let resp = client
            .request(method.clone(), format!("http://{proxy_addr}/api/echo/mls/items?page=2"))
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let seen: Value = resp.json().await.unwrap();
        assert_eq!(seen["method"], method.as_str());
        assert_eq!(seen["uri"], "/api/v1/echo/mls/items?page=2");
        assert_eq!(seen["body"], body);
    }
}

#[tokio::test]
async fn bare_api_prefix_is_forwarded() {
    let upstream_addr = spawn(upstream()).await;
    let proxy_addr = spawn_proxy(&format!("http://{upstream_addr}")).await;

    let resp = reqwest::get(format!("http://{proxy_addr}/api/"))
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "api root");
}

#[test]
fn invalid_upstream_is_rejected() {
    assert!(ProxyState::new("not a url", proxy_client().unwrap(), noop()).is_err());
}
