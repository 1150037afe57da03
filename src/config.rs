use std::{env, net::SocketAddr, path::Path};

use serde::Deserialize;

use crate::error::{Error, Result};

/// 配置文件路径的环境变量
pub const CONFIG_ENV: &str = "YBLOG_CONFIG";

/// 运行配置
///
/// 取值优先级从低到高：默认值、`YBLOG_CONFIG` 指向的 TOML 文件、环境变量。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// PostgreSQL 连接 URL，未设置时使用内存存储
    pub database_url: Option<String>,
    /// 监听地址
    pub listen: SocketAddr,
    /// 管理接口的 Bearer token，未设置时管理接口关闭
    pub admin_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            listen: SocketAddr::from(([0, 0, 0, 0], 3000)),
            admin_token: None,
        }
    }
}

impl Config {
    /// 从配置文件和环境变量加载
    pub fn load() -> Result<Self> {
        let config = match env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.with_overrides(|key| env::var(key).ok())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 用 `lookup` 查到的值覆盖对应字段，空字符串视为未设置
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("DATABASE_URL") {
            self.database_url = Some(url);
        }
        if let Some(listen) = get("YBLOG_LISTEN") {
            self.listen = listen
                .parse()
                .map_err(|_| Error::Config(format!("invalid YBLOG_LISTEN: {listen}")))?;
        }
        if let Some(token) = get("YBLOG_ADMIN_TOKEN") {
            self.admin_token = Some(token);
        }
        Ok(self)
    }
}
