//! Shared helpers for integration tests.
//!
//! Remote content sources are served by an in-process axum server bound to an
//! ephemeral port on 127.0.0.1.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Router,
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use fetchtext::Record;
use serde_json::Value;

pub const SLOW_RESPONSE_DELAY: Duration = Duration::from_millis(100);

/// Base64 of `user:pass`.
pub const BASIC_CREDENTIALS: &str = "dXNlcjpwYXNz";

/// Nonce issued in the `/digest` challenge.
pub const DIGEST_NONCE: &str = "dcd98b7102dd2f0e8b11d0f600bfb0c093";

const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D, b'I', b'H', b'D', b'R'];

#[derive(Debug, Default)]
pub struct UpstreamStats {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
}

/// Handle to a running upstream server.
pub struct Upstream {
    pub base_url: String,
    stats: Arc<UpstreamStats>,
}

impl Upstream {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Highest number of requests the upstream served at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.stats.peak.load(Ordering::SeqCst)
    }

    pub fn total_requests(&self) -> usize {
        self.stats.total.load(Ordering::SeqCst)
    }
}

/// Start the upstream server.
///
/// Routes:
/// - `/ok` - `200` "hello"
/// - `/missing` - `404`
/// - `/error` - `500`
/// - `/slow/{id}` - `200` "slow {id}" after [`SLOW_RESPONSE_DELAY`]
/// - `/html` - `200` small HTML page
/// - `/xml` - `200` small XML document
/// - `/png` - `200` PNG header bytes
/// - `/secure` - `200` "authorized" with basic credentials `user:pass`, `401` otherwise
/// - `/digest` - `401` digest challenge, `200` "digested" once answered for user `user`
pub async fn spawn_upstream() -> Upstream {
    let stats = Arc::new(UpstreamStats::default());

    let app = Router::new()
        .route("/ok", get(|| async { "hello" }))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .route("/error", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/slow/{id}", get(slow_handler))
        .route(
            "/html",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "text/html")],
                    "<!DOCTYPE html><html><body><h1>Release notes</h1><p>Body text</p></body></html>",
                )
            }),
        )
        .route(
            "/xml",
            get(|| async { "<?xml version=\"1.0\"?><feed><title>Feed</title><entry>First entry</entry></feed>" }),
        )
        .route("/png", get(|| async { PNG_HEADER.to_vec() }))
        .route("/secure", get(secure_handler))
        .route("/digest", get(digest_handler))
        .layer(middleware::from_fn_with_state(stats.clone(), track_in_flight));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Upstream {
        base_url: format!("http://{}", addr),
        stats,
    }
}

/// A URL on a port nothing is listening on.
pub async fn refused_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/gone", addr)
}

pub fn records(value: Value) -> Vec<Record> {
    value
        .as_array()
        .expect("test payload must be an array")
        .iter()
        .map(|v| v.as_object().cloned().expect("test records must be objects"))
        .collect()
}

async fn slow_handler(Path(id): Path<String>) -> String {
    tokio::time::sleep(SLOW_RESPONSE_DELAY).await;
    format!("slow {}", id)
}

async fn secure_handler(headers: HeaderMap) -> Response {
    let expected = format!("Basic {}", BASIC_CREDENTIALS);
    match headers.get(header::AUTHORIZATION) {
        Some(value) if value == expected.as_str() => "authorized".into_response(),
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn digest_handler(headers: HeaderMap) -> Response {
    let answered = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value.starts_with("Digest ")
                && value.contains("username=\"user\"")
                && value.contains(&format!("nonce=\"{}\"", DIGEST_NONCE))
                && value.contains("response=\"")
        });
    if answered {
        return "digested".into_response();
    }
    let challenge = format!("Digest realm=\"fetchtext\", qop=\"auth\", nonce=\"{}\"", DIGEST_NONCE);
    (StatusCode::UNAUTHORIZED, [(header::WWW_AUTHENTICATE, challenge)]).into_response()
}

async fn track_in_flight(State(stats): State<Arc<UpstreamStats>>, request: Request, next: Next) -> Response {
    stats.total.fetch_add(1, Ordering::SeqCst);
    let now = stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    stats.peak.fetch_max(now, Ordering::SeqCst);

    let response = next.run(request).await;

    stats.in_flight.fetch_sub(1, Ordering::SeqCst);
    response
}
