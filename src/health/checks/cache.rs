//! 缓存读写检查

use crate::cache::Cache;
use crate::error::HealthCheckError;
use crate::health::check::{Check, CheckStatus};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// 在共享缓存上执行一次写入、读取、删除
pub struct CacheCheck {
    cache: Arc<dyn Cache>,
}

impl CacheCheck {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }
}

/// 写入成功后持有的探测键，未显式删除就被丢弃时（例如检查超时被取消）在后台删除
struct ProbeKey {
    cache: Arc<dyn Cache>,
    key: String,
    armed: bool,
}

impl ProbeKey {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for ProbeKey {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let cache = self.cache.clone();
            let key = std::mem::take(&mut self.key);
            handle.spawn(async move {
                if let Err(e) = cache.forget(&key).await {
                    tracing::warn!(key = %key, "清理缓存检查键失败: {}", e);
                }
            });
        }
    }
}

#[async_trait]
impl Check for CacheCheck {
    fn name(&self) -> &str {
        "cache"
    }

    async fn run(&self) -> Result<CheckStatus, HealthCheckError> {
        let token = Uuid::new_v4().to_string();
        let key = format!("app-health:cache-check:{token}");

        self.cache.put(&key, &token).await?;
        let mut probe = ProbeKey {
            cache: self.cache.clone(),
            key: key.clone(),
            armed: true,
        };

        // 读取失败也要先删除探测键，再返回错误
        let read_back = self.cache.get(&key).await;
        let forgotten = self.cache.forget(&key).await;
        if forgotten.is_ok() {
            probe.disarm();
        }
        let read_back = read_back?;
        forgotten?;

        match read_back {
            Some(value) if value == token => Ok(CheckStatus::ok()),
            Some(_) => Ok(CheckStatus::problem(format!(
                "{} cache returned a different value than was written",
                self.cache.driver()
            ))),
            None => Ok(CheckStatus::problem(format!(
                "{} cache did not keep the written value",
                self.cache.driver()
            ))),
        }
    }
}
