//! 调度器存活检查
//!
//! 读取心跳命令写入缓存的时间戳，时间戳缺失或超过阈值即判定调度器停止运行。

use crate::cache::Cache;
use crate::clock::Clock;
use crate::config::types::SchedulerCheckConfig;
use crate::error::{ConfigError, HealthCheckError};
use crate::health::check::{Check, CheckStatus};
use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;

/// 心跳时间戳允许超前当前时间的秒数
const MAX_CLOCK_SKEW_SECONDS: i64 = 60;

/// 调度器心跳检查
pub struct SchedulerCheck {
    cache: Arc<dyn Cache>,
    clock: Arc<dyn Clock>,
    cache_key: String,
    threshold: Duration,
}

impl SchedulerCheck {
    pub fn new(
        cache: Arc<dyn Cache>,
        clock: Arc<dyn Clock>,
        cache_key: impl Into<String>,
        threshold: Duration,
    ) -> Self {
        Self {
            cache,
            clock,
            cache_key: cache_key.into(),
            threshold,
        }
    }

    pub fn from_config(
        config: &SchedulerCheckConfig,
        cache: Arc<dyn Cache>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(
            cache,
            clock,
            config.cache_key.clone(),
            config.staleness_threshold()?,
        ))
    }
}

#[async_trait]
impl Check for SchedulerCheck {
    fn name(&self) -> &str {
        "scheduler"
    }

    async fn run(&self) -> Result<CheckStatus, HealthCheckError> {
        // 缓存不可用时无法确认存活，按失败处理
        let raw = match self.cache.get(&self.cache_key).await {
            Ok(raw) => raw,
            Err(e) => {
                return Ok(CheckStatus::problem(format!(
                    "cannot read scheduler heartbeat: {e}"
                )))
            }
        };

        let Some(raw) = raw else {
            return Ok(CheckStatus::problem("scheduler has never run"));
        };

        let Ok(last_run) = raw.trim().parse::<i64>() else {
            return Ok(CheckStatus::problem(format!(
                "invalid scheduler heartbeat value: {raw:?}"
            )));
        };

        let Some(elapsed) = self.clock.now().timestamp().checked_sub(last_run) else {
            return Ok(CheckStatus::problem(format!(
                "invalid scheduler heartbeat value: {raw:?}"
            )));
        };

        // 时间戳晚于当前时间超过允许的时钟偏差，心跳无法证明调度器仍在运行
        if elapsed < -MAX_CLOCK_SKEW_SECONDS {
            return Ok(CheckStatus::problem(format!(
                "scheduler heartbeat is {}s in the future",
                -elapsed
            )));
        }

        if elapsed > self.threshold.num_seconds() {
            return Ok(CheckStatus::problem(format!(
                "scheduler has not run in the last {} minutes (last heartbeat {}s ago)",
                self.threshold.num_minutes(),
                elapsed
            )));
        }

        Ok(CheckStatus::ok())
    }
}
