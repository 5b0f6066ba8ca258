//! 日志输出检查

use crate::error::HealthCheckError;
use crate::health::check::{Check, CheckStatus};
use async_trait::async_trait;
use std::path::PathBuf;

/// 确认日志能够写出。配置了日志文件时检查文件可追加写入
pub struct LogCheck {
    file_path: Option<PathBuf>,
}

impl LogCheck {
    pub fn new(file_path: Option<PathBuf>) -> Self {
        Self { file_path }
    }
}

#[async_trait]
impl Check for LogCheck {
    fn name(&self) -> &str {
        "log"
    }

    async fn run(&self) -> Result<CheckStatus, HealthCheckError> {
        if let Some(path) = &self.file_path {
            tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .await
                .map_err(|source| HealthCheckError::Io {
                    context: format!("log file {} is not writable", path.display()),
                    source,
                })?;
        }

        tracing::debug!("日志健康检查");
        Ok(CheckStatus::ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_logging_passes() {
        assert!(LogCheck::new(None).run().await.unwrap().passed);
    }

    #[tokio::test]
    async fn test_log_file_must_be_writable() {
        let dir = tempfile::TempDir::new().unwrap();
        let ok = LogCheck::new(Some(dir.path().join("app.log")));
        assert!(ok.run().await.unwrap().passed);

        let broken = LogCheck::new(Some(dir.path().join("missing").join("app.log")));
        let err = broken.run().await.unwrap_err();
        assert!(err.to_string().contains("is not writable"));
    }
}
