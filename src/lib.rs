//! App Health - 应用健康检查服务
//!
//! 按顺序执行一组健康检查并汇总结果，支持：
//! - 可配置前缀下的 `/health` 与 `/ping` 路由
//! - 调度器心跳与过期检测
//! - 内存/文件共享缓存
//! - 结构化日志记录

pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod web;

// 重新导出主要类型
pub use config::Config;
pub use error::AppHealthError;
pub use health::{AppHealth, Check, CheckStatus, HealthReport, OverallStatus, SchedulerHeartbeat};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
