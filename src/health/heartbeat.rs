//! 调度器心跳
//!
//! 由外部定时任务（如cron每分钟一次）调用，把当前时间戳写入共享缓存，
//! 供 [`SchedulerCheck`](crate::health::checks::SchedulerCheck) 读取。

use crate::cache::Cache;
use crate::clock::Clock;
use crate::config::types::SchedulerCheckConfig;
use crate::error::CacheError;
use std::sync::Arc;
use tracing::info;

/// 调度器心跳写入器
pub struct SchedulerHeartbeat {
    cache: Arc<dyn Cache>,
    clock: Arc<dyn Clock>,
    cache_key: String,
}

impl SchedulerHeartbeat {
    pub fn new(cache: Arc<dyn Cache>, clock: Arc<dyn Clock>, cache_key: impl Into<String>) -> Self {
        Self {
            cache,
            clock,
            cache_key: cache_key.into(),
        }
    }

    pub fn from_config(
        config: &SchedulerCheckConfig,
        cache: Arc<dyn Cache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(cache, clock, config.cache_key.clone())
    }

    /// 写入当前Unix时间戳并返回写入的值，重复调用只是覆盖
    pub async fn run(&self) -> Result<i64, CacheError> {
        let timestamp = self.clock.now().timestamp();
        self.cache
            .put(&self.cache_key, &timestamp.to_string())
            .await?;

        info!(
            key = %self.cache_key,
            driver = self.cache.driver(),
            timestamp,
            "调度器心跳已写入"
        );
        Ok(timestamp)
    }
}
