//! 共享缓存模块
//!
//! 提供简单的键值存储抽象。调度器心跳命令与HTTP进程之间
//! 只通过这里的缓存交换时间戳。

pub mod file;
pub mod memory;

use crate::config::types::{CacheConfig, CacheDriver};
use crate::error::CacheError;
use async_trait::async_trait;
use std::sync::Arc;

pub use file::FileCache;
pub use memory::MemoryCache;

/// 缓存trait，只提供读、写、删除三个原语，写入的值不过期
#[async_trait]
pub trait Cache: Send + Sync {
    /// 读取键对应的值
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// 写入键值，覆盖旧值
    async fn put(&self, key: &str, value: &str) -> Result<(), CacheError>;

    /// 删除键，返回键是否存在
    async fn forget(&self, key: &str) -> Result<bool, CacheError>;

    /// 驱动名称
    fn driver(&self) -> &'static str;
}

/// 根据配置创建缓存实例
pub fn from_config(config: &CacheConfig) -> Arc<dyn Cache> {
    match config.driver {
        CacheDriver::Memory => Arc::new(MemoryCache::new()),
        CacheDriver::File => Arc::new(FileCache::new(config.path.clone())),
    }
}
