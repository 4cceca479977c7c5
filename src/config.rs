//! 服务配置加载
//!
//! API 凭证只从环境变量读取（`.env` 文件经 dotenv 生效）：
//! ```text
//! PERPLEXITY_API_KEY=pplx-...
//! ```
//! 监听地址等服务参数可选地由 YAML 文件提供，CLI 参数优先。

use crate::error::{ChatError, ConfigError, Result};
use dotenv::dotenv;
use serde::{Deserialize, Serialize};

/// 凭证所在的环境变量名
pub const API_KEY_ENV: &str = "PERPLEXITY_API_KEY";

/// 服务进程配置（不含凭证）
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// 会话导出目录
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_export_dir() -> String {
    ".".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            export_dir: default_export_dir(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &str) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|_| ConfigError::FileNotFound(path.to_string()))?;
        let config: ServerConfig = serde_yaml::from_reader(file)?;
        Ok(config)
    }
}

/// 读取 provider 凭证；缺失或为空时返回 [`ChatError::MissingCredential`]。
/// 必须在任何路由开始服务之前调用（启动期 fail-fast）。
pub fn api_key_from_env() -> Result<String> {
    dotenv().ok();
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(ChatError::MissingCredential),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5000);
        assert_eq!(config.export_dir, ".");
    }

    #[test]
    fn test_load_partial_yaml_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port: 8080").unwrap();
        let config = ServerConfig::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(matches!(
            ServerConfig::load("/nonexistent/sonar.yaml"),
            Err(ChatError::Config(ConfigError::FileNotFound(_)))
        ));
    }
}
