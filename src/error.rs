//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use thiserror::Error;

/// App Health 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum AppHealthError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 健康检查相关错误
    #[error("健康检查错误: {0}")]
    HealthCheck(#[from] HealthCheckError),

    /// 缓存相关错误
    #[error("缓存错误: {0}")]
    Cache(#[from] CacheError),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },

    /// 路由名称未注册
    #[error("未注册的路由名称: {0}")]
    UnknownRoute(String),
}

/// 健康检查错误类型
#[derive(Error, Debug)]
pub enum HealthCheckError {
    /// HTTP请求错误
    #[error("HTTP请求失败: {0}")]
    RequestError(#[from] reqwest::Error),

    /// 超时错误
    #[error("check timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// 状态码不匹配
    #[error("{url} returned status {actual}, expected {expected}")]
    StatusCodeMismatch {
        url: String,
        expected: u16,
        actual: u16,
    },

    /// 检查过程中的IO失败
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// 依赖的缓存不可用
    #[error("cache unavailable: {0}")]
    Cache(#[from] CacheError),
}

/// 缓存错误类型
#[derive(Error, Debug)]
pub enum CacheError {
    /// 读写底层存储失败
    #[error("缓存存储读写失败: {path}: {source}")]
    Storage {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 缓存文件内容损坏
    #[error("缓存文件内容无效: {path}: {source}")]
    Corrupted {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppHealthError>;
