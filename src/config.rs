use std::{env, path::PathBuf, time::Duration};

use serde::Deserialize;

use crate::error::{Error, Result};

/// 服务配置
///
/// 先读取 `TRAVELBOOK_CONFIG` 指向的 TOML 文件（可选），再由环境变量覆盖：
///
/// - `DATABASE_URL`：数据库连接地址
/// - `TRAVELBOOK_ADDR`：监听地址，默认 `0.0.0.0:3000`
/// - `TRAVELBOOK_MEDIA_ROOT`：媒体文件根目录，默认 `./media`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: String,
    pub media_root: PathBuf,
    pub pool: PoolConfig,
}

/// 连接池配置，时间单位为秒
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
    pub idle_timeout: u64,
    pub max_lifetime: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            listen_addr: "0.0.0.0:3000".to_string(),
            media_root: PathBuf::from("./media"),
            pool: PoolConfig::default(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            acquire_timeout: 2,
            idle_timeout: 60,
            max_lifetime: 1500,
        }
    }
}

impl PoolConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout)
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime)
    }
}

impl Config {
    /// 从 TOML 文本解析配置
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 读取配置文件与环境变量
    pub fn from_env() -> Result<Self> {
        let mut config = match env::var("TRAVELBOOK_CONFIG") {
            Ok(path) => Self::from_toml(&std::fs::read_to_string(path)?)?,
            Err(_) => Self::default(),
        };

        config.apply_overrides(|key| env::var(key).ok());

        if config.database_url.is_empty() {
            return Err(Error::validation("DATABASE_URL not set"));
        }
        Ok(config)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(addr) = lookup("TRAVELBOOK_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(root) = lookup("TRAVELBOOK_MEDIA_ROOT") {
            self.media_root = PathBuf::from(root);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_toml_partial() {
        let content = r#"
            database_url = "postgres://localhost/travelbook"

            [pool]
            max_connections = 4
        "#;

        let config = Config::from_toml(content).expect("Failed to parse config");

        assert_eq!(config.database_url, "postgres://localhost/travelbook");
        assert_eq!(config.listen_addr, "0.0.0.0:3000");
        assert_eq!(config.pool.max_connections, 4);
        // 未配置的字段使用默认值
        assert_eq!(config.pool.min_connections, 2);
        assert_eq!(config.pool.acquire_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_config_env_overrides_file() {
        let mut config =
            Config::from_toml(r#"listen_addr = "127.0.0.1:8080""#).expect("Failed to parse");

        config.apply_overrides(|key| match key {
            "TRAVELBOOK_ADDR" => Some("127.0.0.1:9000".to_string()),
            "TRAVELBOOK_MEDIA_ROOT" => Some("/srv/media".to_string()),
            _ => None,
        });

        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.media_root, PathBuf::from("/srv/media"));
        assert!(config.database_url.is_empty());
    }

    #[test]
    fn test_config_invalid_toml() {
        assert!(matches!(
            Config::from_toml("pool = 3"),
            Err(Error::Config(_))
        ));
    }
}
