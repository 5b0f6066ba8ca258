//! 健康检查接口定义

use crate::error::HealthCheckError;
use async_trait::async_trait;
use serde::Serialize;

/// 单个健康检查，检查项之间互不依赖
#[async_trait]
pub trait Check: Send + Sync {
    /// 检查名称，作为 `/health` 响应中的键
    fn name(&self) -> &str;

    /// 执行检查
    ///
    /// 返回 `Err` 时由聚合器转换为失败结果，不会中断其他检查
    async fn run(&self) -> Result<CheckStatus, HealthCheckError>;
}

/// 单次检查的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckStatus {
    /// 是否通过
    pub passed: bool,
    /// 说明信息，失败时必有
    pub message: Option<String>,
}

impl CheckStatus {
    /// 检查通过
    pub fn ok() -> Self {
        Self {
            passed: true,
            message: None,
        }
    }

    /// 检查通过并附带说明
    pub fn ok_with_message(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: Some(message.into()),
        }
    }

    /// 检查失败
    pub fn problem(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: Some(message.into()),
        }
    }
}
