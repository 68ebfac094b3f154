#![cfg(feature = "server")]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use bazi_fortune::api::{router, AppState};
use bazi_fortune::HistoryStore;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

struct TestApp {
    app: Router,
    history: Arc<HistoryStore>,
    dir: PathBuf,
}

impl TestApp {
    fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("bazi_api_{}", Uuid::new_v4()));
        let history = Arc::new(HistoryStore::open(dir.join("fortune_history.json")));
        let app = router(AppState::new(Arc::clone(&history)).with_clock(fixed_today));
        Self { app, history, dir }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn calculate(&self, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/calculate")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.dir).ok();
    }
}

#[tokio::test]
async fn test_calculate_golden_chart() {
    let app = TestApp::new();
    let (status, body) = app
        .calculate(json!({"birthDate": "1990-01-01", "birthHour": 0, "gender": "male"}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(
        body["bazi"],
        json!({
            "year": {"stem": "甲", "branch": "巳"},
            "month": {"stem": "甲", "branch": "子"},
            "day": {"stem": "己", "branch": "丑"},
            "hour": {"stem": "己", "branch": "子"},
        })
    );
    assert_eq!(body["elements"], json!({"木": 2, "火": 1, "土": 3, "金": 0, "水": 2}));
    assert_eq!(body["fortune"], json!(54));
    assert_eq!(body["wealth"], json!(58));
    assert_eq!(body["advice"], json!(["五行平衡，顺势而为"]));
    assert_eq!(body["lunar"], json!({"year": 1989, "month": 12, "day": 5}));
    assert_eq!(body["balance"]["土"], json!({"count": 3, "percentage": 37.5, "rating": "强"}));
    assert_eq!(body["balance"]["火"]["rating"], json!("弱"));
    assert_eq!(body["day_master"]["stem"], json!("己"));
    assert_eq!(body["day_master"]["strength"], json!(100));
    assert_eq!(body["day_master"]["supported_by"], json!("火"));
    assert_eq!(body["day_master"]["controlled_by"], json!("木"));

    assert_eq!(app.history.load().len(), 1);
}

#[tokio::test]
async fn test_calculate_accepts_string_hour_and_other_gender() {
    let app = TestApp::new();
    let (status, body) = app
        .calculate(json!({"birthDate": "1990-01-01", "birthHour": "0", "gender": "female"}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fortune"], json!(58));
}

#[tokio::test]
async fn test_calculate_accepts_fractional_hour() {
    let app = TestApp::new();
    let (status, body) = app
        .calculate(json!({"birthDate": "1990-01-01", "birthHour": 0.0, "gender": "male"}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bazi"]["hour"], json!({"stem": "己", "branch": "子"}));
    assert_eq!(app.history.load().len(), 1);
}

#[tokio::test]
async fn test_malformed_date_is_rejected_without_history() {
    let app = TestApp::new();
    let (status, body) = app
        .calculate(json!({"birthDate": "not-a-date", "birthHour": 0, "gender": "male"}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().unwrap().contains("birthDate"));
    assert!(app.history.load().is_empty());
}

#[tokio::test]
async fn test_other_client_errors() {
    let app = TestApp::new();

    let cases = [
        json!({"birthHour": 0, "gender": "male"}),
        json!({"birthDate": "1990-01-01", "birthHour": 24, "gender": "male"}),
        json!({"birthDate": "1890-06-01", "birthHour": 3, "gender": "male"}),
        json!({"birthDate": "2101-01-01", "birthHour": 3, "gender": "male"}),
    ];
    for case in cases {
        let (status, body) = app.calculate(case).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
    }

    let request = Request::builder()
        .method("POST")
        .uri("/api/calculate")
        .header("content-type", "application/json")
        .body(Body::from("{ broken"))
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.history.load().is_empty());
}

#[tokio::test]
async fn test_history_and_statistics_are_capped() {
    let app = TestApp::new();
    let start = NaiveDate::from_ymd_opt(1980, 3, 1).unwrap();

    for i in 0..105 {
        let date = start + chrono::Duration::days(i);
        let (status, _) = app
            .calculate(json!({
                "birthDate": date.format("%Y-%m-%d").to_string(),
                "birthHour": i % 24,
                "gender": "male",
            }))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, history) = app.get("/api/history").await;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 20);

    let first = start + chrono::Duration::days(85);
    let last = start + chrono::Duration::days(104);
    assert_eq!(history[0]["birth_date"], json!(first.format("%Y-%m-%d").to_string()));
    assert_eq!(history[19]["birth_date"], json!(last.format("%Y-%m-%d").to_string()));

    let (status, stats) = app.get("/api/statistics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], json!(100));
    assert!(stats["avg_fortune"].as_f64().unwrap() > 0.0);
    assert!(stats["avg_wealth"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_empty_statistics() {
    let app = TestApp::new();
    let (status, stats) = app.get("/api/statistics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats, json!({"total": 0, "avg_fortune": 0.0, "avg_wealth": 0.0}));

    let (_, history) = app.get("/api/history").await;
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "data": "OK"}));
}
