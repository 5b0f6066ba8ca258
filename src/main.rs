//! App Health 主程序入口

use anyhow::{Context, Result};
use app_health::cli::args::{Args, Commands};
use app_health::cli::commands::{
    load_config, CheckCommand, Command, InitCommand, SchedulerHeartbeatCommand, ServeCommand,
    ValidateCommand, VersionCommand,
};
use app_health::config::LoggingConfig;
use app_health::logging::{LogConfig, LoggingSystem};
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let args = Args::parse();

    // 初始化日志系统，配置文件中的日志设置在命令行未指定级别时生效
    let settings = logging_settings(&args).await;
    let log_config = LogConfig::from_settings(&settings, args.log_level.map(Into::into));
    let _logging_system = LoggingSystem::setup_logging(log_config).context("初始化日志系统失败")?;

    info!("App Health v{} 启动", app_health::VERSION);

    if let Err(e) = execute_command(&args).await {
        error!("命令执行失败: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// 读取日志设置，失败时使用默认值，错误留给具体命令报告
async fn logging_settings(args: &Args) -> LoggingConfig {
    match args.command {
        Commands::Init { .. } | Commands::Version { .. } => LoggingConfig::default(),
        _ => load_config(args)
            .await
            .map(|config| config.logging)
            .unwrap_or_default(),
    }
}

/// 执行CLI命令
async fn execute_command(args: &Args) -> Result<()> {
    let result = match &args.command {
        Commands::Serve { .. } => {
            let (shutdown_tx, _) = broadcast::channel(1);
            spawn_signal_listener(shutdown_tx.clone());
            ServeCommand::new(shutdown_tx).execute(args).await
        }
        Commands::CacheSchedulerRunning => SchedulerHeartbeatCommand.execute(args).await,
        Commands::Check { .. } => CheckCommand.execute(args).await,
        Commands::Init { .. } => InitCommand.execute(args).await,
        Commands::Validate { .. } => ValidateCommand.execute(args).await,
        Commands::Version { .. } => VersionCommand.execute(args).await,
    };

    result.map_err(|e| anyhow::anyhow!(e))
}

/// 监听 Ctrl+C 与 SIGTERM，收到后广播关闭信号
fn spawn_signal_listener(shutdown_tx: broadcast::Sender<()>) {
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("接收到关闭信号");
        let _ = shutdown_tx.send(());
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            error!("注册SIGTERM处理失败: {}", e);
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("监听Ctrl+C信号失败: {}", e);
    }
}
