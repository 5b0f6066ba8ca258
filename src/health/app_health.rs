//! 健康检查聚合器
//!
//! 按配置顺序依次执行所有检查，单项检查的错误、panic或超时
//! 只会让该项失败，不影响其他检查和整体响应。

use crate::config::HealthCheckConfig;
use crate::error::{HealthCheckError, Result};
use crate::health::check::{Check, CheckStatus};
use crate::health::registry::{CheckContext, CheckRegistry};
use crate::health::result::{CheckResult, HealthReport};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// 健康检查聚合器
#[derive(Clone)]
pub struct AppHealth {
    /// 按顺序执行的检查
    checks: Vec<Arc<dyn Check>>,
    /// 单项检查超时
    check_timeout: Option<Duration>,
}

impl std::fmt::Debug for AppHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppHealth")
            .field("checks", &self.check_names())
            .field("check_timeout", &self.check_timeout)
            .finish()
    }
}

impl AppHealth {
    /// 创建聚合器
    pub fn new(checks: Vec<Arc<dyn Check>>) -> Self {
        Self {
            checks,
            check_timeout: None,
        }
    }

    /// 设置单项检查超时
    pub fn with_check_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.check_timeout = timeout;
        self
    }

    /// 根据配置通过注册表创建全部检查
    ///
    /// 未知的检查标识在这里返回错误，而不是等到请求时
    pub fn from_config(
        config: &HealthCheckConfig,
        registry: &CheckRegistry,
        context: &CheckContext,
    ) -> Result<Self> {
        let checks = registry.build_all(&config.checks, context)?;
        let timeout = config.check_timeout_seconds.map(Duration::from_secs);
        Ok(Self::new(checks).with_check_timeout(timeout))
    }

    /// 检查名称列表
    pub fn check_names(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    /// 执行全部检查并汇总
    pub async fn evaluate(&self) -> HealthReport {
        let mut results = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            results.push(self.run_check(check.as_ref()).await);
        }

        let report = HealthReport::from_results(results);
        debug!(
            status = %report.status,
            checks = report.results.len(),
            "健康检查评估完成"
        );
        report
    }

    /// 执行单项检查，错误、panic和超时都转换为失败结果
    async fn run_check(&self, check: &dyn Check) -> CheckResult {
        let start = Instant::now();
        let guarded = AssertUnwindSafe(check.run()).catch_unwind();

        let outcome = match self.check_timeout {
            Some(limit) => match tokio::time::timeout(limit, guarded).await {
                Ok(outcome) => outcome,
                Err(_) => Ok(Err(HealthCheckError::Timeout(limit))),
            },
            None => guarded.await,
        };

        let status = match outcome {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => CheckStatus::problem(e.to_string()),
            Err(panic) => CheckStatus::problem(panic_message(panic.as_ref())),
        };

        let result = CheckResult {
            name: check.name().to_string(),
            passed: status.passed,
            message: status.message,
            duration: start.elapsed(),
        };

        if result.passed {
            info!(
                check = %result.name,
                duration_ms = result.duration_ms(),
                "健康检查通过"
            );
        } else {
            warn!(
                check = %result.name,
                duration_ms = result.duration_ms(),
                message = result.message.as_deref().unwrap_or(""),
                "健康检查失败"
            );
        }

        result
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("check panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("check panicked: {message}")
    } else {
        "check panicked".to_string()
    }
}
