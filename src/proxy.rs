//! Same-origin forwarder for the ASA API.
//!
//! `/api/<rest>?<query>` is rewritten to `<upstream>/api/v1/<rest>?<query>`. The
//! method, headers and body go through unchanged except `Host`, which is set to
//! the upstream host. Upstream status, headers and body come back as-is, minus
//! `Transfer-Encoding`. A transport failure becomes a JSON error body.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use reqwest::Url;
use serde_json::json;

use crate::config::AppConfig;
use crate::error::ProxyError;
use crate::observe::{RequestEvent, SharedObserver};

/// Requests to the stats API are GETs; anything larger than this is refused.
const MAX_REQUEST_BODY: usize = 8 * 1024 * 1024;

#[derive(Clone)]
pub struct ProxyState {
    upstream_base: Arc<str>,
    upstream_host: Option<HeaderValue>,
    client: reqwest::Client,
    observer: SharedObserver,
}

impl ProxyState {
    pub fn new(
        upstream_base: &str,
        client: reqwest::Client,
        observer: SharedObserver,
    ) -> Result<Self, ProxyError> {
        let base = upstream_base.trim().trim_end_matches('/');
        let parsed =
            Url::parse(base).map_err(|_| ProxyError::InvalidUpstream(upstream_base.to_string()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| ProxyError::InvalidUpstream(upstream_base.to_string()))?;
        let authority = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        Ok(Self {
            upstream_base: Arc::from(base),
            upstream_host: HeaderValue::from_str(&authority).ok(),
            client,
            observer,
        })
    }
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/api/", any(forward))
        .route("/api/*rest", any(forward))
        .fallback(not_found)
        .with_state(state)
}

/// Map an incoming `/api/...` path (with query) onto the upstream URL.
/// Paths outside `/api/` are not proxied.
pub fn rewrite_target(upstream_base: &str, path_and_query: &str) -> Option<String> {
    let rest = path_and_query.strip_prefix("/api/")?;
    let base = upstream_base.trim_end_matches('/');
    Some(format!("{base}/api/v1/{rest}"))
}

async fn forward(State(state): State<ProxyState>, req: Request) -> Response {
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let Some(target) = rewrite_target(&state.upstream_base, &path_and_query) else {
        return not_found().await.into_response();
    };

    let (parts, body) = req.into_parts();
    let body = match axum::body::to_bytes(body, MAX_REQUEST_BODY).await {
        Ok(bytes) => bytes,
        Err(err) => {
            return proxy_error(StatusCode::PAYLOAD_TOO_LARGE, &err.to_string());
        }
    };

    state
        .observer
        .observe(&RequestEvent::Started { url: target.clone() });
    let started = Instant::now();

    let mut request = state
        .client
        .request(parts.method.clone(), &target)
        .headers(forward_request_headers(&parts.headers, state.upstream_host.as_ref()));
    if !body.is_empty() {
        request = request.body(body);
    }

    match request.send().await {
        Ok(upstream) => {
            let status = upstream.status();
            state.observer.observe(&RequestEvent::Completed {
                url: target,
                status: status.as_u16(),
                items: None,
                elapsed: started.elapsed(),
            });

            let mut builder = Response::builder().status(status);
            if let Some(headers) = builder.headers_mut() {
                *headers = forward_response_headers(upstream.headers());
            }
            builder
                .body(Body::from_stream(upstream.bytes_stream()))
                .unwrap_or_else(|err| {
                    proxy_error(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
                })
        }
        Err(err) => {
            let status = err.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            state.observer.observe(&RequestEvent::Failed {
                url: target,
                status: Some(status.as_u16()),
                message: err.to_string(),
            });
            proxy_error(status, &err.to_string())
        }
    }
}

fn forward_request_headers(incoming: &HeaderMap, host: Option<&HeaderValue>) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(incoming.len());
    for (name, value) in incoming {
        if name == header::HOST
            || name == header::CONTENT_LENGTH
            || name == header::TRANSFER_ENCODING
            || name == header::CONNECTION
        {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    if let Some(host) = host {
        headers.insert(header::HOST, host.clone());
    }
    headers
}

/// Upstream headers minus `Transfer-Encoding`; the body is re-framed on the way out.
fn forward_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if name == header::TRANSFER_ENCODING {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

fn proxy_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        axum::Json(json!({ "message": "Proxy error", "error": message })),
    )
        .into_response()
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, axum::Json(json!({ "message": "Not found" })))
}

/// Bind `config.proxy_bind` and serve until the process is stopped.
pub async fn serve(config: &AppConfig, observer: SharedObserver) -> Result<(), ProxyError> {
    let client = crate::http_client::proxy_client()?;
    let state = ProxyState::new(&config.upstream_base, client, observer)?;
    let listener = tokio::net::TcpListener::bind(config.proxy_bind)
        .await
        .map_err(|source| ProxyError::Bind {
            addr: config.proxy_bind,
            source,
        })?;
    tracing::info!(
        addr = %config.proxy_bind,
        upstream = %config.upstream_base,
        "proxy listening"
    );
    axum::serve(listener, router(state))
        .await
        .map_err(ProxyError::Serve)
}
