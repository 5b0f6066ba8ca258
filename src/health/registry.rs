//! 检查注册表
//!
//! 将配置中的字符串标识映射到检查的构造函数

use crate::cache::Cache;
use crate::clock::Clock;
use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::health::check::Check;
use crate::health::checks::{
    CacheCheck, EnvCheck, HttpCheck, LogCheck, SchedulerCheck, StorageCheck,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// 构造检查时可用的依赖
#[derive(Clone)]
pub struct CheckContext {
    /// 完整配置
    pub config: Arc<Config>,
    /// 共享缓存
    pub cache: Arc<dyn Cache>,
    /// 时钟
    pub clock: Arc<dyn Clock>,
}

impl CheckContext {
    pub fn new(config: Arc<Config>, cache: Arc<dyn Cache>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            cache,
            clock,
        }
    }
}

fn unknown_check(identifier: &str) -> ConfigError {
    ConfigError::ValidationError(format!("未知的健康检查: {identifier}"))
}

/// 检查构造函数
pub type CheckFactory = Box<dyn Fn(&CheckContext) -> Result<Arc<dyn Check>> + Send + Sync>;

/// 检查注册表
pub struct CheckRegistry {
    factories: BTreeMap<String, CheckFactory>,
}

impl CheckRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// 创建包含全部内置检查的注册表
    pub fn with_builtin_checks() -> Self {
        let mut registry = Self::new();
        registry.register("log", |ctx| {
            Ok(Arc::new(LogCheck::new(ctx.config.logging.file_path.clone())) as Arc<dyn Check>)
        });
        registry.register("env", |ctx| {
            Ok(Arc::new(EnvCheck::new(ctx.config.healthcheck.env.required.clone())) as Arc<dyn Check>)
        });
        registry.register("http", |ctx| {
            Ok(Arc::new(HttpCheck::from_config(&ctx.config.healthcheck.http)?) as Arc<dyn Check>)
        });
        registry.register("cache", |ctx| {
            Ok(Arc::new(CacheCheck::new(ctx.cache.clone())) as Arc<dyn Check>)
        });
        registry.register("storage", |ctx| {
            Ok(
                Arc::new(StorageCheck::new(ctx.config.healthcheck.storage.directories.clone()))
                    as Arc<dyn Check>,
            )
        });
        registry.register("scheduler", |ctx| {
            Ok(Arc::new(SchedulerCheck::from_config(
                &ctx.config.healthcheck.scheduler,
                ctx.cache.clone(),
                ctx.clock.clone(),
            )?) as Arc<dyn Check>)
        });
        registry
    }

    /// 注册检查，同名标识会被覆盖
    pub fn register<F>(&mut self, identifier: impl Into<String>, factory: F)
    where
        F: Fn(&CheckContext) -> Result<Arc<dyn Check>> + Send + Sync + 'static,
    {
        self.factories.insert(identifier.into(), Box::new(factory));
    }

    /// 是否注册了该标识
    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }

    /// 已注册的标识（按字母序）
    pub fn identifiers(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// 构造单个检查
    pub fn build(&self, identifier: &str, context: &CheckContext) -> Result<Arc<dyn Check>> {
        let factory = self
            .factories
            .get(identifier)
            .ok_or_else(|| unknown_check(identifier))?;
        factory(context)
    }

    /// 按顺序构造配置中的全部检查
    ///
    /// 先确认所有标识都已注册，再开始构造
    pub fn build_all(
        &self,
        identifiers: &[String],
        context: &CheckContext,
    ) -> Result<Vec<Arc<dyn Check>>> {
        if let Some(unknown) = identifiers.iter().find(|id| !self.contains(id)) {
            return Err(unknown_check(unknown).into());
        }

        identifiers
            .iter()
            .map(|identifier| self.build(identifier, context))
            .collect()
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::with_builtin_checks()
    }
}
