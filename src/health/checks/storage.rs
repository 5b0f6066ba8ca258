//! 存储目录读写检查

use crate::error::HealthCheckError;
use crate::health::check::{Check, CheckStatus};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// 在每个配置的目录中写入、读取并删除一个探测文件
pub struct StorageCheck {
    directories: Vec<PathBuf>,
}

impl StorageCheck {
    pub fn new(directories: Vec<PathBuf>) -> Self {
        Self { directories }
    }

    async fn probe(directory: &Path) -> Result<bool, HealthCheckError> {
        let token = Uuid::new_v4().to_string();
        let probe = directory.join(format!(".app-health-{token}"));
        let io_error = |action: &str| {
            let context = format!("{action} {}", probe.display());
            move |source| HealthCheckError::Io { context, source }
        };

        tokio::fs::write(&probe, &token)
            .await
            .map_err(io_error("cannot write"))?;
        let content = tokio::fs::read_to_string(&probe).await;
        let removed = tokio::fs::remove_file(&probe).await;

        let content = content.map_err(io_error("cannot read"))?;
        removed.map_err(io_error("cannot delete"))?;

        Ok(content == token)
    }
}

#[async_trait]
impl Check for StorageCheck {
    fn name(&self) -> &str {
        "storage"
    }

    async fn run(&self) -> Result<CheckStatus, HealthCheckError> {
        let mut problems = Vec::new();
        for directory in &self.directories {
            match Self::probe(directory).await {
                Ok(true) => {}
                Ok(false) => problems.push(format!(
                    "{}: probe file content changed",
                    directory.display()
                )),
                Err(e) => problems.push(e.to_string()),
            }
        }

        if problems.is_empty() {
            Ok(CheckStatus::ok())
        } else {
            Ok(CheckStatus::problem(problems.join("; ")))
        }
    }
}
