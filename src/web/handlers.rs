//! Web 路由处理函数
//!
//! 实现 `/health`、`/ping` 以及签名校验中间件

use super::WebAppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use tracing::warn;

/// 健康检查处理函数，每次请求执行全部检查
pub async fn health(State(state): State<WebAppState>) -> Response {
    let report = state.health.evaluate().await;
    let status = if report.is_ok() {
        state.ok_status
    } else {
        state.problem_status
    };

    (status, Json(report)).into_response()
}

/// 存活探测，不执行任何检查
pub async fn ping() -> &'static str {
    "pong"
}

/// 要求请求携带有效签名
pub async fn require_signature(
    State(state): State<WebAppState>,
    request: Request,
    next: Next,
) -> Response {
    let verified = {
        let uri = request.uri();
        let target = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path());
        match state.routes.signer() {
            Some(signer) => signer.verify(target, state.clock.now()),
            None => Err(super::routes::SignatureError::Missing),
        }
    };

    match verified {
        Ok(()) => next.run(request).await,
        Err(e) => {
            warn!(path = %request.uri().path(), "签名校验失败: {}", e);
            (StatusCode::FORBIDDEN, e.to_string()).into_response()
        }
    }
}
