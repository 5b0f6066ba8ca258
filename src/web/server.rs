//! Web服务器实现
//!
//! 绑定监听地址并运行路由，收到关闭信号后优雅退出

use crate::clock::Clock;
use crate::config::Config;
use crate::error::Result;
use crate::health::AppHealth;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::info;

/// Web服务器
pub struct WebServer {
    /// 监听地址
    addr: SocketAddr,
    /// 路由
    router: Router,
    /// 健康检查路由路径，仅用于日志
    health_path: String,
    /// 关闭信号接收器
    shutdown_rx: Option<broadcast::Receiver<()>>,
}

impl WebServer {
    /// 创建新的Web服务器
    pub fn new(
        config: &Config,
        health: AppHealth,
        clock: Arc<dyn Clock>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<Self> {
        let addr = config.server.socket_addr()?;
        let router = super::create_router(config, health, clock)?;

        Ok(Self {
            addr,
            router,
            health_path: config.healthcheck.health_path(),
            shutdown_rx: Some(shutdown_rx),
        })
    }

    /// 监听地址
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// 启动Web服务器，直到收到关闭信号
    pub async fn start(&mut self) -> Result<()> {
        let mut shutdown_rx = self.shutdown_rx.take().ok_or_else(|| {
            crate::error::AppHealthError::Other(anyhow::anyhow!("关闭信号接收器已被使用"))
        })?;

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Web服务器已启动: http://{}{}", local_addr, self.health_path);

        axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("接收到关闭信号，正在关闭Web服务器...");
            })
            .await?;

        info!("Web服务器已关闭");
        Ok(())
    }
}
