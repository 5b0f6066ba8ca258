//! 命名路由与签名URL
//!
//! 健康检查路由以 `route_name` 注册，宿主应用可以按名称生成URL，
//! 配置签名密钥后还可以生成带有效期的签名URL。

use crate::config::Config;
use crate::error::ConfigError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::BTreeMap;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// 签名校验失败原因
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("缺少签名")]
    Missing,
    #[error("签名无效")]
    Invalid,
    #[error("签名已过期")]
    Expired,
}

/// URL签名器，HMAC-SHA256，签名以base64url编码放在 `signature` 参数中
#[derive(Clone)]
pub struct UrlSigner {
    mac: HmacSha256,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("UrlSigner { .. }")
    }
}

impl UrlSigner {
    /// 使用密钥创建签名器
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self, ConfigError> {
        let mac = HmacSha256::new_from_slice(key.as_ref())
            .map_err(|e| ConfigError::ValidationError(format!("无效的签名密钥: {e}")))?;
        Ok(Self { mac })
    }

    fn signature(&self, payload: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    /// 为路径签名，`expires` 为过期的Unix时间戳
    pub fn sign(&self, path: &str, expires: Option<i64>) -> String {
        let payload = match expires {
            Some(expires) => format!("{path}?expires={expires}"),
            None => path.to_string(),
        };
        let signature = self.signature(&payload);
        let separator = if payload.contains('?') { '&' } else { '?' };
        format!("{payload}{separator}signature={signature}")
    }

    /// 校验 `path?query` 形式的请求目标
    ///
    /// 除 `signature` 外的全部参数按原顺序参与签名
    pub fn verify(&self, path_and_query: &str, now: DateTime<Utc>) -> Result<(), SignatureError> {
        let (path, query) = match path_and_query.split_once('?') {
            Some((path, query)) => (path, query),
            None => (path_and_query, ""),
        };

        let mut signature = None;
        let mut expires = None;
        let mut signed_params = Vec::new();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "signature" => signature = Some(value),
                "expires" => {
                    expires = Some(value);
                    signed_params.push(pair);
                }
                _ => signed_params.push(pair),
            }
        }

        let signature = signature.ok_or(SignatureError::Missing)?;
        let provided = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| SignatureError::Invalid)?;

        let payload = if signed_params.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{}", signed_params.join("&"))
        };

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.verify_slice(&provided)
            .map_err(|_| SignatureError::Invalid)?;

        if let Some(expires) = expires {
            let expires: i64 = expires.parse().map_err(|_| SignatureError::Invalid)?;
            if now.timestamp() > expires {
                return Err(SignatureError::Expired);
            }
        }

        Ok(())
    }
}

/// 路由名称到路径的映射
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: BTreeMap<String, String>,
    public_url: Option<String>,
    signer: Option<UrlSigner>,
}

impl RouteTable {
    /// 创建空路由表
    pub fn new(public_url: Option<String>, signer: Option<UrlSigner>) -> Self {
        Self {
            routes: BTreeMap::new(),
            public_url: public_url.map(|url| url.trim_end_matches('/').to_string()),
            signer,
        }
    }

    /// 根据配置注册 health 与 ping 路由
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let signer = config
            .server
            .signing_key
            .as_deref()
            .map(UrlSigner::new)
            .transpose()?;

        let hc = &config.healthcheck;
        let mut table = Self::new(config.server.public_url.clone(), signer);
        table.register(hc.route_name.clone(), hc.health_path())?;
        table.register(hc.ping_route_name(), hc.ping_path())?;
        Ok(table)
    }

    /// 注册命名路由，名称重复时报错
    pub fn register(
        &mut self,
        name: impl Into<String>,
        path: impl Into<String>,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        if self.routes.contains_key(&name) {
            return Err(ConfigError::ValidationError(format!("路由名称重复: {name}")));
        }
        self.routes.insert(name, path.into());
        Ok(())
    }

    /// 路由路径
    pub fn path(&self, name: &str) -> Option<&str> {
        self.routes.get(name).map(String::as_str)
    }

    /// 按路径反查路由名称
    pub fn name_for_path(&self, path: &str) -> Option<&str> {
        self.routes
            .iter()
            .find(|(_, route_path)| route_path.as_str() == path)
            .map(|(name, _)| name.as_str())
    }

    /// 签名器
    pub fn signer(&self) -> Option<&UrlSigner> {
        self.signer.as_ref()
    }

    fn absolute(&self, path: &str) -> String {
        match &self.public_url {
            Some(base) => format!("{base}{path}"),
            None => path.to_string(),
        }
    }

    /// 按名称生成URL，配置了 `public_url` 时为绝对地址
    pub fn url_for(&self, name: &str) -> Result<String, ConfigError> {
        let path = self
            .path(name)
            .ok_or_else(|| ConfigError::UnknownRoute(name.to_string()))?;
        Ok(self.absolute(path))
    }

    /// 按名称生成签名URL
    pub fn signed_url(
        &self,
        name: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<String, ConfigError> {
        let path = self
            .path(name)
            .ok_or_else(|| ConfigError::UnknownRoute(name.to_string()))?;
        let signer = self.signer.as_ref().ok_or_else(|| {
            ConfigError::ValidationError("生成签名URL需要配置 server.signing_key".to_string())
        })?;
        Ok(self.absolute(&signer.sign(path, expires_at.map(|t| t.timestamp()))))
    }
}
