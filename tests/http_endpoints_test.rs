//! HTTP 路由集成测试
//!
//! 通过 `tower::ServiceExt::oneshot` 在进程内请求路由

use app_health::clock::{Clock, ManualClock, SystemClock};
use app_health::config::Config;
use app_health::error::HealthCheckError;
use app_health::health::{AppHealth, Check, CheckStatus};
use app_health::web::{create_router, RouteTable};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

struct FixedCheck {
    name: &'static str,
    passed: bool,
    runs: Arc<AtomicUsize>,
}

impl FixedCheck {
    fn new(name: &'static str, passed: bool) -> Self {
        Self {
            name,
            passed,
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Check for FixedCheck {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(&self) -> Result<CheckStatus, HealthCheckError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(if self.passed {
            CheckStatus::ok()
        } else {
            CheckStatus::problem(format!("{} is down", self.name))
        })
    }
}

fn router(config: &Config, checks: Vec<Arc<dyn Check>>) -> Router {
    create_router(config, AppHealth::new(checks), Arc::new(SystemClock)).unwrap()
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn health_without_checks_reports_ok() {
    let app = router(&Config::default(), Vec::new());

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value, json!({ "status": "OK" }));
}

#[tokio::test]
async fn ping_returns_pong() {
    let app = router(&Config::default(), Vec::new());

    let (status, body) = get(&app, "/ping").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "pong");
}

#[tokio::test]
async fn base_path_prefixes_both_routes() {
    let mut config = Config::default();
    config.healthcheck.base_path = "/test/".to_string();
    let app = router(&config, Vec::new());

    assert_eq!(get(&app, "/test/ping").await, (StatusCode::OK, "pong".to_string()));
    assert_eq!(get(&app, "/test/health").await.0, StatusCode::OK);
    assert_eq!(get(&app, "/ping").await.0, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/health").await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_base_path_serves_root_routes() {
    let mut config = Config::default();
    config.healthcheck.base_path = String::new();
    let app = router(&config, Vec::new());

    assert_eq!(get(&app, "/ping").await.0, StatusCode::OK);
    assert_eq!(get(&app, "/health").await.0, StatusCode::OK);
}

#[test]
fn health_route_is_registered_under_configured_name() {
    let mut config = Config::default();
    config.healthcheck.route_name = "healthcheck".to_string();
    config.healthcheck.base_path = "/test/".to_string();
    config.server.signing_key = Some("base64:test-key".to_string());

    let routes = RouteTable::from_config(&config).unwrap();
    assert_eq!(routes.name_for_path("/test/health"), Some("healthcheck"));
    assert_eq!(routes.url_for("healthcheck").unwrap(), "/test/health");
    assert!(routes.signed_url("healthcheck", None).is_ok());
}

#[tokio::test]
async fn failed_check_reports_fail_with_problem_code() {
    let app = router(
        &Config::default(),
        vec![
            Arc::new(FixedCheck::new("queue", false)),
            Arc::new(FixedCheck::new("database", true)),
        ],
    );

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["status"], "FAIL");
    assert_eq!(value["checks"]["database"]["passed"], true);
    assert_eq!(value["checks"]["queue"]["passed"], false);
    assert_eq!(value["checks"]["queue"]["message"], "queue is down");

    // 输出顺序与注册顺序一致
    assert!(body.find("\"queue\"").unwrap() < body.find("\"database\"").unwrap());
}

#[tokio::test]
async fn configured_problem_code_is_used() {
    let mut config = Config::default();
    config.healthcheck.default_problem_http_code = 503;
    let app = router(&config, vec![Arc::new(FixedCheck::new("queue", false))]);

    assert_eq!(get(&app, "/health").await.0, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn ping_does_not_run_checks() {
    let check = FixedCheck::new("queue", false);
    let runs = check.runs.clone();
    let app = router(&Config::default(), vec![Arc::new(check)]);

    assert_eq!(get(&app, "/ping").await.0, StatusCode::OK);
    assert_eq!(runs.load(Ordering::SeqCst), 0);

    get(&app, "/health").await;
    get(&app, "/health").await;
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn signed_urls_are_enforced_when_required() {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(now));

    let mut config = Config::default();
    config.healthcheck.require_signed_urls = true;
    config.server.signing_key = Some("test-key".to_string());

    let app = create_router(
        &config,
        AppHealth::new(Vec::new()),
        clock.clone() as Arc<dyn Clock>,
    )
    .unwrap();
    let routes = RouteTable::from_config(&config).unwrap();

    assert_eq!(get(&app, "/health").await.0, StatusCode::FORBIDDEN);

    let signed = routes
        .signed_url("healthcheck", Some(now + Duration::minutes(5)))
        .unwrap();
    assert_eq!(get(&app, &signed).await.0, StatusCode::OK);

    // ping 不需要签名
    assert_eq!(get(&app, "/ping").await.0, StatusCode::OK);

    clock.advance(Duration::minutes(6));
    assert_eq!(get(&app, &signed).await.0, StatusCode::FORBIDDEN);
}
