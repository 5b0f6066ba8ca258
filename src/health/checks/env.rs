//! 环境变量检查

use crate::error::HealthCheckError;
use crate::health::check::{Check, CheckStatus};
use async_trait::async_trait;

/// 确认必需的环境变量存在且非空
pub struct EnvCheck {
    required: Vec<String>,
}

impl EnvCheck {
    pub fn new(required: Vec<String>) -> Self {
        Self { required }
    }

    fn missing(&self) -> Vec<&str> {
        self.required
            .iter()
            .filter(|name| {
                std::env::var(name.as_str())
                    .map(|value| value.is_empty())
                    .unwrap_or(true)
            })
            .map(String::as_str)
            .collect()
    }
}

#[async_trait]
impl Check for EnvCheck {
    fn name(&self) -> &str {
        "env"
    }

    async fn run(&self) -> Result<CheckStatus, HealthCheckError> {
        let missing = self.missing();
        if missing.is_empty() {
            Ok(CheckStatus::ok())
        } else {
            Ok(CheckStatus::problem(format!(
                "missing environment variables: {}",
                missing.join(", ")
            )))
        }
    }
}
