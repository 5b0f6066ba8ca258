//! HTTP依赖检查
//!
//! 依次请求配置的地址，状态码与期望不一致或请求失败都视为检查失败

use crate::config::types::{HttpAddress, HttpCheckConfig};
use crate::error::{HealthCheckError, Result};
use crate::health::check::{Check, CheckStatus};
use async_trait::async_trait;
use reqwest::{Client, Method};
use std::str::FromStr;
use std::time::Duration;

/// HTTP依赖检查
pub struct HttpCheck {
    /// HTTP客户端
    client: Client,
    /// 探测地址
    addresses: Vec<HttpAddress>,
}

impl HttpCheck {
    /// 创建HTTP检查
    ///
    /// # 参数
    /// * `addresses` - 探测地址
    /// * `timeout` - 单次请求超时
    pub fn new(addresses: Vec<HttpAddress>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .build()
            .map_err(HealthCheckError::RequestError)?;

        Ok(Self { client, addresses })
    }

    pub fn from_config(config: &HttpCheckConfig) -> Result<Self> {
        Self::new(
            config.addresses.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    /// 构建HTTP请求
    fn build_request(&self, address: &HttpAddress) -> std::result::Result<reqwest::RequestBuilder, String> {
        let method = Method::from_str(&address.method.to_uppercase())
            .map_err(|_| format!("{}: invalid HTTP method {}", address.url, address.method))?;

        let mut request = self.client.request(method, &address.url);
        for (key, value) in &address.headers {
            request = request.header(key, value);
        }

        Ok(request)
    }

    /// 探测单个地址，失败时返回说明
    async fn probe(&self, address: &HttpAddress) -> Option<String> {
        let request = match self.build_request(address) {
            Ok(request) => request,
            Err(message) => return Some(message),
        };

        match request.send().await {
            Ok(response) => {
                let actual = response.status().as_u16();
                if actual == address.expected_status {
                    None
                } else {
                    Some(
                        HealthCheckError::StatusCodeMismatch {
                            url: address.url.clone(),
                            expected: address.expected_status,
                            actual,
                        }
                        .to_string(),
                    )
                }
            }
            Err(e) => Some(format!("{}: {}", address.url, format_request_error(&e))),
        }
    }
}

/// 格式化请求错误信息
fn format_request_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        "connection refused".to_string()
    } else if error.is_request() {
        "invalid request".to_string()
    } else if error.is_decode() {
        "response decode error".to_string()
    } else {
        let error_str = error.to_string();
        if error_str.contains("dns") || error_str.contains("DNS") {
            "DNS resolution failed".to_string()
        } else if error_str.contains("certificate") || error_str.contains("tls") {
            "SSL/TLS certificate error".to_string()
        } else {
            format!("request failed: {error_str}")
        }
    }
}

#[async_trait]
impl Check for HttpCheck {
    fn name(&self) -> &str {
        "http"
    }

    async fn run(&self) -> std::result::Result<CheckStatus, HealthCheckError> {
        let mut problems = Vec::new();
        for address in &self.addresses {
            if let Some(problem) = self.probe(address).await {
                problems.push(problem);
            }
        }

        if problems.is_empty() {
            Ok(CheckStatus::ok())
        } else {
            Ok(CheckStatus::problem(problems.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn address(url: String, expected_status: u16) -> HttpAddress {
        HttpAddress {
            url,
            method: "GET".to_string(),
            expected_status,
            headers: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_expected_status_passes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/status")
            .match_header("x-probe", "1")
            .with_status(200)
            .create_async()
            .await;

        let mut target = address(format!("{}/status", server.url()), 200);
        target.headers.insert("x-probe".to_string(), "1".to_string());

        let check = HttpCheck::new(vec![target], Duration::from_secs(5)).unwrap();
        let status = check.run().await.unwrap();

        assert!(status.passed);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_status_mismatch_fails_with_details() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server
            .mock("GET", "/ok")
            .with_status(204)
            .create_async()
            .await;
        let _down = server
            .mock("GET", "/down")
            .with_status(503)
            .create_async()
            .await;

        let down_url = format!("{}/down", server.url());
        let check = HttpCheck::new(
            vec![
                address(format!("{}/ok", server.url()), 204),
                address(down_url.clone(), 200),
            ],
            Duration::from_secs(5),
        )
        .unwrap();

        let status = check.run().await.unwrap();
        assert!(!status.passed);
        assert_eq!(
            status.message.unwrap(),
            format!("{down_url} returned status 503, expected 200")
        );
    }

    #[tokio::test]
    async fn test_unreachable_address_fails() {
        let check = HttpCheck::new(
            vec![address("http://127.0.0.1:1/health".to_string(), 200)],
            Duration::from_secs(2),
        )
        .unwrap();

        let status = check.run().await.unwrap();
        assert!(!status.passed);
        assert!(status.message.unwrap().starts_with("http://127.0.0.1:1/health: "));
    }

    #[tokio::test]
    async fn test_invalid_method_fails() {
        let mut target = address("http://127.0.0.1:1/".to_string(), 200);
        target.method = "BAD METHOD".to_string();
        let check = HttpCheck::new(vec![target], Duration::from_secs(1)).unwrap();

        let status = check.run().await.unwrap();
        assert!(status.message.unwrap().contains("invalid HTTP method"));
    }
}
