//! Concurrency tests for the shared worker pool.
//!
//! Many requests run at once against one router; the pool bounds the number of
//! outbound fetches across all of them, and no record ever leaks into another
//! request's response.

#![cfg(feature = "api")]

mod helpers;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use fetchtext::{ServiceConfig, api::create_router};
use serde_json::{Value, json};
use tokio::task::JoinSet;
use tower::ServiceExt;

use helpers::spawn_upstream;

const POOL_SIZE: usize = 3;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pool_bounds_fetches_across_requests() {
    let upstream = spawn_upstream().await;
    let app = create_router(&ServiceConfig {
        pool_size: POOL_SIZE,
        ..Default::default()
    })
    .unwrap();

    let mut requests = JoinSet::new();
    for request_id in 0..6 {
        let payload: Vec<Value> = (0..5)
            .map(|i| {
                json!({
                    "request": request_id,
                    "position": i,
                    "url": upstream.url(&format!("/slow/{}-{}", request_id, i)),
                })
            })
            .collect();
        let app = app.clone();

        requests.spawn(async move {
            let request = Request::builder()
                .method("POST")
                .uri("/transform")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(Value::Array(payload).to_string()))
                .unwrap();
            let response = app.oneshot(request).await.unwrap();
            let status = response.status();
            let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (request_id, status, serde_json::from_slice::<Value>(&body).unwrap())
        });
    }

    while let Some(joined) = requests.join_next().await {
        let (request_id, status, body) = joined.unwrap();
        assert_eq!(status, StatusCode::OK);

        let records = body.as_array().unwrap();
        assert_eq!(records.len(), 5);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record["request"], json!(request_id));
            assert_eq!(record["position"], json!(i));
            assert_eq!(record["_content"], json!(format!("slow {}-{}", request_id, i)));
        }
    }

    assert_eq!(upstream.total_requests(), 30);
    assert!(
        upstream.peak_in_flight() <= POOL_SIZE,
        "peak in-flight {} exceeded pool size {}",
        upstream.peak_in_flight(),
        POOL_SIZE
    );
}

/// A fatal batch does not disturb a healthy batch running at the same time.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fatal_batch_isolated_from_concurrent_batch() {
    let upstream = spawn_upstream().await;
    let app = create_router(&ServiceConfig {
        pool_size: POOL_SIZE,
        ..Default::default()
    })
    .unwrap();

    let healthy: Vec<Value> = (0..6)
        .map(|i| json!({"url": upstream.url(&format!("/slow/{}", i))}))
        .collect();
    let failing = json!([{"url": upstream.url("/error")}, {"url": upstream.url("/slow/x")}]);

    let send = |payload: Value| {
        let app = app.clone();
        async move {
            let request = Request::builder()
                .method("POST")
                .uri("/transform")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap();
            app.oneshot(request).await.unwrap()
        }
    };

    let (healthy_response, failing_response) = tokio::join!(send(Value::Array(healthy)), send(failing));

    assert_eq!(failing_response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(healthy_response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(healthy_response.into_body(), usize::MAX).await.unwrap();
    let records: Value = serde_json::from_slice(&body).unwrap();
    for (i, record) in records.as_array().unwrap().iter().enumerate() {
        assert_eq!(record["_content"], json!(format!("slow {}", i)));
    }
}
