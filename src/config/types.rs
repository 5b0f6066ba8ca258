//! 配置数据结构定义
//!
//! 定义应用程序的配置结构体和验证逻辑

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::path::PathBuf;

/// 主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// 健康检查配置
    #[serde(default)]
    pub healthcheck: HealthCheckConfig,
    /// HTTP服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 共享缓存配置
    #[serde(default)]
    pub cache: CacheConfig,
    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 健康检查配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthCheckConfig {
    /// 路由前缀，默认为空
    #[serde(default)]
    pub base_path: String,
    /// 健康检查路由的名称
    #[serde(default = "default_route_name")]
    pub route_name: String,
    /// 按顺序执行的检查标识列表
    #[serde(default = "default_checks")]
    pub checks: Vec<String>,
    /// 路由路径
    #[serde(default)]
    pub route_paths: RoutePaths,
    /// 全部通过时的HTTP状态码
    #[serde(default = "default_response_code")]
    pub default_response_code: u16,
    /// 存在失败检查时的HTTP状态码
    #[serde(default = "default_problem_http_code")]
    pub default_problem_http_code: u16,
    /// 单个检查的超时时间（秒），不设置则不限制
    #[serde(default)]
    pub check_timeout_seconds: Option<u64>,
    /// 健康检查路由是否要求签名URL
    #[serde(default)]
    pub require_signed_urls: bool,
    /// 调度器检查配置
    #[serde(default)]
    pub scheduler: SchedulerCheckConfig,
    /// 环境变量检查配置
    #[serde(default)]
    pub env: EnvCheckConfig,
    /// HTTP检查配置
    #[serde(default)]
    pub http: HttpCheckConfig,
    /// 存储检查配置
    #[serde(default)]
    pub storage: StorageCheckConfig,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            route_name: default_route_name(),
            checks: default_checks(),
            route_paths: RoutePaths::default(),
            default_response_code: default_response_code(),
            default_problem_http_code: default_problem_http_code(),
            check_timeout_seconds: None,
            require_signed_urls: false,
            scheduler: SchedulerCheckConfig::default(),
            env: EnvCheckConfig::default(),
            http: HttpCheckConfig::default(),
            storage: StorageCheckConfig::default(),
        }
    }
}

impl HealthCheckConfig {
    /// 规范化后的路由前缀，例如 `/test/` 变为 `/test`
    pub fn normalized_base_path(&self) -> String {
        normalize_base_path(&self.base_path)
    }

    /// 健康检查路由的完整路径
    pub fn health_path(&self) -> String {
        format!("{}{}", self.normalized_base_path(), self.route_paths.health)
    }

    /// ping路由的完整路径
    pub fn ping_path(&self) -> String {
        format!("{}{}", self.normalized_base_path(), self.route_paths.ping)
    }

    /// ping路由的名称
    pub fn ping_route_name(&self) -> String {
        format!("{}.ping", self.route_name)
    }
}

/// 路由路径配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutePaths {
    #[serde(default = "default_health_path")]
    pub health: String,
    #[serde(default = "default_ping_path")]
    pub ping: String,
}

impl Default for RoutePaths {
    fn default() -> Self {
        Self {
            health: default_health_path(),
            ping: default_ping_path(),
        }
    }
}

/// 调度器心跳允许的最大间隔（一年）
pub const MAX_MINUTES_BETWEEN_CHECKS: i64 = 60 * 24 * 365;

/// 调度器检查配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulerCheckConfig {
    /// 心跳时间戳所在的缓存键
    #[serde(default = "default_scheduler_cache_key")]
    pub cache_key: String,
    /// 心跳允许的最大间隔（分钟）
    #[serde(default = "default_minutes_between_checks")]
    pub minutes_between_checks: u64,
}

impl Default for SchedulerCheckConfig {
    fn default() -> Self {
        Self {
            cache_key: default_scheduler_cache_key(),
            minutes_between_checks: default_minutes_between_checks(),
        }
    }
}

impl SchedulerCheckConfig {
    /// 过期阈值，分钟数超出可表示范围时返回错误
    pub fn staleness_threshold(&self) -> Result<chrono::Duration, ConfigError> {
        i64::try_from(self.minutes_between_checks)
            .ok()
            .filter(|minutes| *minutes <= MAX_MINUTES_BETWEEN_CHECKS)
            .and_then(chrono::Duration::try_minutes)
            .ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "scheduler.minutes_between_checks 超出范围 (1..={}): {}",
                    MAX_MINUTES_BETWEEN_CHECKS, self.minutes_between_checks
                ))
            })
    }
}

/// 环境变量检查配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EnvCheckConfig {
    /// 必须存在且非空的环境变量
    #[serde(default)]
    pub required: Vec<String>,
}

/// HTTP检查配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpCheckConfig {
    /// 请求超时（秒）
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u64,
    /// 需要探测的地址
    #[serde(default)]
    pub addresses: Vec<HttpAddress>,
}

impl Default for HttpCheckConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_http_timeout(),
            addresses: Vec::new(),
        }
    }
}

/// 单个HTTP探测地址
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpAddress {
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_expected_status")]
    pub expected_status: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// 存储检查配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageCheckConfig {
    /// 需要可读写的目录
    #[serde(default = "default_storage_directories")]
    pub directories: Vec<PathBuf>,
}

impl Default for StorageCheckConfig {
    fn default() -> Self {
        Self {
            directories: default_storage_directories(),
        }
    }
}

/// HTTP服务器配置
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// 绑定地址
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 生成绝对URL时使用的外部地址
    #[serde(default)]
    pub public_url: Option<String>,
    /// 签名URL使用的密钥
    #[serde(default)]
    pub signing_key: Option<String>,
}

// 签名密钥不出现在日志中
impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_address", &self.bind_address)
            .field("port", &self.port)
            .field("public_url", &self.public_url)
            .field("signing_key", &self.signing_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            public_url: None,
            signing_key: None,
        }
    }
}

impl ServerConfig {
    /// 监听的socket地址
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| {
                ConfigError::ValidationError(format!(
                    "无效的监听地址 {}:{}: {}",
                    self.bind_address, self.port, e
                ))
            })
    }
}

/// 缓存驱动类型
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheDriver {
    /// 进程内缓存，心跳命令与服务不在同一进程时无法共享
    Memory,
    /// JSON文件缓存
    #[default]
    File,
}

/// 共享缓存配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    #[serde(default)]
    pub driver: CacheDriver,
    /// 文件驱动使用的路径
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            driver: CacheDriver::default(),
            path: default_cache_path(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json_format: bool,
    /// 日志文件路径，不设置时输出到控制台
    #[serde(default)]
    pub file_path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: None,
        }
    }
}

// 默认值函数
fn default_route_name() -> String {
    "healthcheck".to_string()
}
fn default_checks() -> Vec<String> {
    vec!["log".to_string()]
}
fn default_health_path() -> String {
    "/health".to_string()
}
fn default_ping_path() -> String {
    "/ping".to_string()
}
fn default_response_code() -> u16 {
    200
}
fn default_problem_http_code() -> u16 {
    500
}
fn default_scheduler_cache_key() -> String {
    "app-health:scheduler-heartbeat".to_string()
}
fn default_minutes_between_checks() -> u64 {
    5
}
fn default_http_timeout() -> u64 {
    5
}
fn default_method() -> String {
    "GET".to_string()
}
fn default_expected_status() -> u16 {
    200
}
fn default_storage_directories() -> Vec<PathBuf> {
    vec![PathBuf::from("storage")]
}
fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_cache_path() -> PathBuf {
    PathBuf::from("storage/app-health-cache.json")
}
fn default_log_level() -> String {
    "info".to_string()
}

/// 规范化路由前缀：去掉首尾空白和末尾的斜杠，非空时保证以 `/` 开头
pub fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// 校验路由路径片段
fn validate_route_path(label: &str, path: &str) -> Result<(), String> {
    if !path.starts_with('/') || path.len() < 2 {
        return Err(format!("{label} 必须以 / 开头且不能只有 /: {path:?}"));
    }
    if path.contains("//") {
        return Err(format!("{label} 不能包含连续的 /: {path:?}"));
    }
    if let Some(c) = path
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, '{' | '}' | '*' | '?' | '#' | ':'))
    {
        return Err(format!("{label} 包含非法字符 {c:?}: {path:?}"));
    }
    Ok(())
}

/// 配置验证函数
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &Config) -> Result<(), String> {
    let hc = &config.healthcheck;

    // 验证路由
    if hc.route_name.trim().is_empty() {
        return Err("路由名称不能为空".to_string());
    }

    let base_path = hc.normalized_base_path();
    if !base_path.is_empty() {
        validate_route_path("base_path", &base_path)?;
    }
    validate_route_path("route_paths.health", &hc.route_paths.health)?;
    validate_route_path("route_paths.ping", &hc.route_paths.ping)?;

    if hc.route_paths.health == hc.route_paths.ping {
        return Err(format!(
            "health 与 ping 路由路径不能相同: {}",
            hc.route_paths.health
        ));
    }

    // 验证状态码
    if !(200..=299).contains(&hc.default_response_code) {
        return Err(format!(
            "default_response_code 必须是2xx状态码: {}",
            hc.default_response_code
        ));
    }
    if !(100..=599).contains(&hc.default_problem_http_code)
        || (200..=299).contains(&hc.default_problem_http_code)
    {
        return Err(format!(
            "default_problem_http_code 必须是非2xx的有效状态码: {}",
            hc.default_problem_http_code
        ));
    }

    if hc.check_timeout_seconds == Some(0) {
        return Err("check_timeout_seconds 不能为0".to_string());
    }

    if hc.require_signed_urls && config.server.signing_key.is_none() {
        return Err("启用 require_signed_urls 时必须配置 server.signing_key".to_string());
    }

    // 验证检查列表
    let mut seen = HashSet::new();
    for check in &hc.checks {
        if !seen.insert(check.as_str()) {
            return Err(format!("重复的健康检查: {check}"));
        }
    }

    if hc.scheduler.minutes_between_checks == 0 {
        return Err("scheduler.minutes_between_checks 不能为0".to_string());
    }
    hc.scheduler.staleness_threshold().map_err(|e| e.to_string())?;
    if hc.scheduler.cache_key.trim().is_empty() {
        return Err("scheduler.cache_key 不能为空".to_string());
    }

    if seen.contains("http") {
        if hc.http.addresses.is_empty() {
            return Err("启用 http 检查时至少需要配置一个地址".to_string());
        }
        if hc.http.timeout_seconds == 0 {
            return Err("http.timeout_seconds 不能为0".to_string());
        }
        for address in &hc.http.addresses {
            if !address.url.starts_with("http://") && !address.url.starts_with("https://") {
                return Err(format!("http 检查地址格式无效: {}", address.url));
            }
            if !(100..=599).contains(&address.expected_status) {
                return Err(format!(
                    "http 检查地址 {} 的状态码 {} 无效",
                    address.url, address.expected_status
                ));
            }
        }
    }

    if seen.contains("storage") && hc.storage.directories.is_empty() {
        return Err("启用 storage 检查时至少需要配置一个目录".to_string());
    }

    // 验证服务器配置
    if config.server.port == 0 {
        return Err("服务器端口不能为0".to_string());
    }
    if config.server.bind_address.is_empty() {
        return Err("服务器绑定地址不能为空".to_string());
    }

    // 验证日志级别
    let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_log_levels.contains(&config.logging.level.as_str()) {
        return Err(format!(
            "无效的日志级别: {}，支持的级别: {:?}",
            config.logging.level, valid_log_levels
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.healthcheck.route_name, "healthcheck");
        assert_eq!(config.healthcheck.base_path, "");
        assert_eq!(config.healthcheck.default_response_code, 200);
        assert_eq!(config.healthcheck.default_problem_http_code, 500);
        assert_eq!(config.healthcheck.scheduler.minutes_between_checks, 5);
        assert_eq!(config.cache.driver, CacheDriver::File);
    }

    #[test]
    fn test_normalize_base_path() {
        assert_eq!(normalize_base_path(""), "");
        assert_eq!(normalize_base_path("/"), "");
        assert_eq!(normalize_base_path("  "), "");
        assert_eq!(normalize_base_path("/test/"), "/test");
        assert_eq!(normalize_base_path("test"), "/test");
        assert_eq!(normalize_base_path("/api/v1//"), "/api/v1");
    }

    #[test]
    fn test_full_paths_use_base_path() {
        let mut config = HealthCheckConfig::default();
        assert_eq!(config.health_path(), "/health");
        assert_eq!(config.ping_path(), "/ping");

        config.base_path = "/test/".to_string();
        assert_eq!(config.health_path(), "/test/health");
        assert_eq!(config.ping_path(), "/test/ping");
        assert_eq!(config.ping_route_name(), "healthcheck.ping");
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();

        let serialized = toml::to_string(&config).expect("序列化失败");
        assert!(!serialized.is_empty());

        let deserialized: Config = toml::from_str(&serialized).expect("反序列化失败");
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_validation_rejects_invalid_base_path() {
        let mut config = Config::default();
        config.healthcheck.base_path = "/with space/".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("非法字符"));
    }

    #[test]
    fn test_validation_rejects_same_route_paths() {
        let mut config = Config::default();
        config.healthcheck.route_paths.ping = "/health".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("不能相同"));
    }

    #[test]
    fn test_validation_rejects_route_path_without_slash() {
        let mut config = Config::default();
        config.healthcheck.route_paths.health = "health".to_string();

        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_rejects_empty_route_name() {
        let mut config = Config::default();
        config.healthcheck.route_name = " ".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("路由名称"));
    }

    #[test]
    fn test_validation_rejects_status_codes() {
        let mut config = Config::default();
        config.healthcheck.default_problem_http_code = 200;
        assert!(validate_config(&config)
            .unwrap_err()
            .contains("default_problem_http_code"));

        let mut config = Config::default();
        config.healthcheck.default_problem_http_code = 999;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.healthcheck.default_response_code = 404;
        assert!(validate_config(&config)
            .unwrap_err()
            .contains("default_response_code"));
    }

    #[test]
    fn test_validation_rejects_duplicate_checks() {
        let mut config = Config::default();
        config.healthcheck.checks = vec!["env".to_string(), "env".to_string()];

        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("重复"));
    }

    #[test]
    fn test_validation_rejects_zero_scheduler_threshold() {
        let mut config = Config::default();
        config.healthcheck.scheduler.minutes_between_checks = 0;

        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_debug_output_redacts_signing_key() {
        let mut config = Config::default();
        config.server.signing_key = Some("super-secret-key".to_string());

        let output = format!("{:?}", config);
        assert!(!output.contains("super-secret-key"));
        assert!(output.contains("<redacted>"));
    }

    #[test]
    fn test_validation_rejects_unrepresentable_scheduler_threshold() {
        let mut config = Config::default();

        for minutes in [u64::MAX, 200_000_000_000_000_000, MAX_MINUTES_BETWEEN_CHECKS as u64 + 1] {
            config.healthcheck.scheduler.minutes_between_checks = minutes;
            assert!(validate_config(&config).is_err(), "{minutes} accepted");
            assert!(config.healthcheck.scheduler.staleness_threshold().is_err());
        }

        config.healthcheck.scheduler.minutes_between_checks = MAX_MINUTES_BETWEEN_CHECKS as u64;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_requires_signing_key() {
        let mut config = Config::default();
        config.healthcheck.require_signed_urls = true;
        assert!(validate_config(&config).unwrap_err().contains("signing_key"));

        config.server.signing_key = Some("secret".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_http_check_requires_addresses() {
        let mut config = Config::default();
        config.healthcheck.checks = vec!["http".to_string()];
        assert!(validate_config(&config).unwrap_err().contains("http"));

        config.healthcheck.http.addresses.push(HttpAddress {
            url: "ftp://example.com".to_string(),
            method: "GET".to_string(),
            expected_status: 200,
            headers: HashMap::new(),
        });
        assert!(validate_config(&config).unwrap_err().contains("格式无效"));

        config.healthcheck.http.addresses[0].url = "https://example.com".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_rejects_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().contains("日志级别"));
    }

    #[test]
    fn test_socket_addr() {
        let server = ServerConfig {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            ..Default::default()
        };
        assert_eq!(server.socket_addr().unwrap().to_string(), "0.0.0.0:3000");

        let invalid = ServerConfig {
            bind_address: "not an address".to_string(),
            ..Default::default()
        };
        assert!(invalid.socket_addr().is_err());
    }

    #[test]
    fn test_scheduler_threshold() {
        let scheduler = SchedulerCheckConfig::default();
        assert_eq!(
            scheduler.staleness_threshold().unwrap(),
            chrono::Duration::minutes(5)
        );
    }
}
