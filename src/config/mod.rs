//! 配置管理模块
//!
//! 提供配置文件解析与验证功能

pub mod loader;
pub mod types;

// 重新导出主要类型
pub use loader::{get_default_config_path, ConfigLoader, TomlConfigLoader};
pub use types::{
    validate_config, CacheConfig, CacheDriver, Config, HealthCheckConfig, LoggingConfig,
    ServerConfig,
};

/// `init` 命令写出的默认配置文件
pub const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("default.toml");
