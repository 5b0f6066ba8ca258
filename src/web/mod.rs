//! Web 路由模块
//!
//! 在可配置的前缀下注册 `/health` 与 `/ping`

use crate::clock::Clock;
use crate::config::{validate_config, Config};
use crate::error::{ConfigError, Result};
use crate::health::AppHealth;
use axum::{http::StatusCode, middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod handlers;
pub mod routes;
pub mod server;

pub use routes::{RouteTable, SignatureError, UrlSigner};
pub use server::WebServer;

/// 处理函数共享的状态
#[derive(Clone)]
pub struct WebAppState {
    /// 健康检查聚合器
    pub health: Arc<AppHealth>,
    /// 命名路由表
    pub routes: Arc<RouteTable>,
    /// 签名过期判断使用的时钟
    pub clock: Arc<dyn Clock>,
    /// 全部通过时的状态码
    pub ok_status: StatusCode,
    /// 存在失败时的状态码
    pub problem_status: StatusCode,
}

fn status_code(label: &str, code: u16) -> std::result::Result<StatusCode, ConfigError> {
    StatusCode::from_u16(code)
        .map_err(|e| ConfigError::ValidationError(format!("{label} 无效: {code}: {e}")))
}

/// 创建路由
///
/// 配置错误（路径、路由名、状态码）在这里返回，不会推迟到请求时
pub fn create_router(config: &Config, health: AppHealth, clock: Arc<dyn Clock>) -> Result<Router> {
    validate_config(config).map_err(ConfigError::ValidationError)?;

    let hc = &config.healthcheck;
    let routes = RouteTable::from_config(config)?;
    let state = WebAppState {
        health: Arc::new(health),
        routes: Arc::new(routes),
        clock,
        ok_status: status_code("default_response_code", hc.default_response_code)?,
        problem_status: status_code("default_problem_http_code", hc.default_problem_http_code)?,
    };

    let mut health_route = get(handlers::health);
    if hc.require_signed_urls {
        health_route = health_route.route_layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::require_signature,
        ));
    }

    tracing::debug!(
        health = %hc.health_path(),
        ping = %hc.ping_path(),
        route_name = %hc.route_name,
        "注册健康检查路由"
    );

    Ok(Router::new()
        .route(&hc.health_path(), health_route)
        .route(&hc.ping_path(), get(handlers::ping))
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
