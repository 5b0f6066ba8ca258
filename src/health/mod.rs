//! 健康检查模块
//!
//! 提供检查接口、内置检查、注册表、聚合器和调度器心跳

pub mod app_health;
pub mod check;
pub mod checks;
pub mod heartbeat;
pub mod registry;
pub mod result;

// 重新导出主要类型
pub use app_health::AppHealth;
pub use check::{Check, CheckStatus};
pub use heartbeat::SchedulerHeartbeat;
pub use registry::{CheckContext, CheckRegistry};
pub use result::{CheckResult, HealthReport, OverallStatus};
