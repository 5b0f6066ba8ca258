//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑

use crate::cache::{self, Cache};
use crate::cli::args::{Args, Commands, OutputFormat};
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, ConfigLoader, TomlConfigLoader, DEFAULT_CONFIG_TEMPLATE};
use crate::error::{AppHealthError, ConfigError, Result};
use crate::health::{
    AppHealth, CheckContext, CheckRegistry, HealthReport, SchedulerHeartbeat,
};
use crate::web::WebServer;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    async fn execute(&self, args: &Args) -> Result<()>;
}

/// 加载配置
///
/// 显式指定的文件不存在时报错；默认位置没有配置文件时使用默认配置
pub async fn load_config(args: &Args) -> Result<Config> {
    let path = args.get_config_path();
    if !args.has_explicit_config() && !path.exists() {
        warn!("未找到配置文件 {}，使用默认配置", path.display());
        return Ok(Config::default());
    }

    let loader = TomlConfigLoader::new(true);
    let config = loader.load_from_file(&path).await?;
    info!("已加载配置文件: {}", path.display());
    Ok(config)
}

/// 配置、缓存与时钟，构造检查与心跳所需的运行时依赖
struct Runtime {
    config: Arc<Config>,
    cache: Arc<dyn Cache>,
    clock: Arc<dyn Clock>,
}

impl Runtime {
    fn new(config: Config) -> Self {
        let cache = cache::from_config(&config.cache);
        Self {
            config: Arc::new(config),
            cache,
            clock: Arc::new(SystemClock),
        }
    }

    fn context(&self) -> CheckContext {
        CheckContext::new(self.config.clone(), self.cache.clone(), self.clock.clone())
    }

    fn app_health(&self) -> Result<AppHealth> {
        AppHealth::from_config(
            &self.config.healthcheck,
            &CheckRegistry::with_builtin_checks(),
            &self.context(),
        )
    }
}

/// 启动HTTP服务
pub struct ServeCommand {
    shutdown_tx: broadcast::Sender<()>,
}

impl ServeCommand {
    /// `shutdown_tx` 上的任意消息都会让服务器优雅退出
    pub fn new(shutdown_tx: broadcast::Sender<()>) -> Self {
        Self { shutdown_tx }
    }
}

#[async_trait]
impl Command for ServeCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        let Commands::Serve { bind, port } = &args.command else {
            return Ok(());
        };

        let mut config = load_config(args).await?;
        if let Some(bind) = bind {
            config.server.bind_address = bind.clone();
        }
        if let Some(port) = port {
            config.server.port = *port;
        }

        let runtime = Runtime::new(config);
        let health = runtime.app_health()?;
        info!(
            checks = ?health.check_names(),
            cache = runtime.cache.driver(),
            "健康检查已配置"
        );

        let mut server = WebServer::new(
            &runtime.config,
            health,
            runtime.clock.clone(),
            self.shutdown_tx.subscribe(),
        )?;
        server.start().await
    }
}

/// 写入调度器心跳
pub struct SchedulerHeartbeatCommand;

#[async_trait]
impl Command for SchedulerHeartbeatCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        let config = load_config(args).await?;
        let runtime = Runtime::new(config);
        let heartbeat = SchedulerHeartbeat::from_config(
            &runtime.config.healthcheck.scheduler,
            runtime.cache.clone(),
            runtime.clock.clone(),
        );

        heartbeat.run().await?;
        Ok(())
    }
}

/// 执行一次健康检查
pub struct CheckCommand;

impl CheckCommand {
    /// 评估全部检查，不输出
    pub async fn evaluate(&self, config: Config) -> Result<HealthReport> {
        let runtime = Runtime::new(config);
        let health = runtime.app_health()?;
        Ok(health.evaluate().await)
    }

    fn render(report: &HealthReport, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Text => {
                let mut out = format!("状态: {}\n", report.status);
                for result in &report.results {
                    let mark = if result.passed { "✓" } else { "✗" };
                    out.push_str(&format!(
                        "{} {} ({}ms)",
                        mark,
                        result.name,
                        result.duration_ms()
                    ));
                    if let Some(message) = &result.message {
                        out.push_str(&format!(" - {message}"));
                    }
                    out.push('\n');
                }
                Ok(out)
            }
        }
    }
}

#[async_trait]
impl Command for CheckCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        let Commands::Check { format } = &args.command else {
            return Ok(());
        };

        let config = load_config(args).await?;
        let report = self.evaluate(config).await?;
        print!("{}", Self::render(&report, *format)?);

        if report.is_ok() {
            Ok(())
        } else {
            let failed: Vec<&str> = report.failures().map(|r| r.name.as_str()).collect();
            Err(AppHealthError::Other(anyhow::anyhow!(
                "健康检查未通过: {}",
                failed.join(", ")
            )))
        }
    }
}

/// 初始化命令
pub struct InitCommand;

impl InitCommand {
    /// 写入默认配置模板，文件已存在且未指定 `force` 时返回 false
    pub async fn create_config_file(&self, config_path: &Path, force: bool) -> Result<bool> {
        if config_path.exists() && !force {
            return Ok(false);
        }

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        tokio::fs::write(config_path, DEFAULT_CONFIG_TEMPLATE).await?;
        Ok(true)
    }
}

#[async_trait]
impl Command for InitCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        let Commands::Init { config_path, force } = &args.command else {
            return Ok(());
        };

        if self.create_config_file(config_path, *force).await? {
            println!("配置文件已创建: {}", config_path.display());
        } else {
            eprintln!("配置文件已存在: {}", config_path.display());
            eprintln!("使用 --force 参数覆盖现有文件");
        }
        Ok(())
    }
}

/// 验证命令
pub struct ValidateCommand;

impl ValidateCommand {
    /// 加载并验证配置，同时构造全部检查以发现未知标识
    pub async fn validate_config_file(&self, config_path: &Path) -> Result<Config> {
        if !config_path.exists() {
            return Err(ConfigError::FileNotFound {
                path: config_path.display().to_string(),
            }
            .into());
        }

        let config = TomlConfigLoader::new(true).load_from_file(config_path).await?;
        Runtime::new(config.clone()).app_health()?;
        Ok(config)
    }
}

#[async_trait]
impl Command for ValidateCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        let Commands::Validate {
            config_path,
            verbose,
        } = &args.command
        else {
            return Ok(());
        };

        let config_file = config_path
            .clone()
            .unwrap_or_else(|| args.get_config_path());
        println!("验证配置文件: {}", config_file.display());

        let config = self.validate_config_file(&config_file).await?;
        let hc = &config.healthcheck;

        println!("✓ 配置文件验证通过");
        if *verbose {
            println!("健康检查:");
            println!("  路由名称: {}", hc.route_name);
            println!("  health: {}", hc.health_path());
            println!("  ping: {}", hc.ping_path());
            println!("  检查项: {}", hc.checks.join(", "));
            println!("  失败状态码: {}", hc.default_problem_http_code);
            println!(
                "  调度器阈值: {}分钟 (key: {})",
                hc.scheduler.minutes_between_checks, hc.scheduler.cache_key
            );
            println!("服务器: {}:{}", config.server.bind_address, config.server.port);
            println!("缓存: {:?} {}", config.cache.driver, config.cache.path.display());
        } else {
            println!("✓ 共 {} 项检查", hc.checks.len());
        }

        Ok(())
    }
}

/// 版本命令
pub struct VersionCommand;

#[async_trait]
impl Command for VersionCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Version { format } = &args.command {
            match format {
                OutputFormat::Json => {
                    let version_info = serde_json::json!({
                        "name": crate::APP_NAME,
                        "version": crate::VERSION,
                        "description": crate::APP_DESCRIPTION
                    });
                    println!("{}", serde_json::to_string_pretty(&version_info)?);
                }
                OutputFormat::Text => {
                    println!("{} v{}", crate::APP_NAME, crate::VERSION);
                    println!("{}", crate::APP_DESCRIPTION);
                }
            }
        }
        Ok(())
    }
}
