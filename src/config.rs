// 服务配置
// JSON 文件，所有字段都有默认值；文件不存在时使用默认配置

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::constants::discovery::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_OUTPUT_BYTES,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_SSH_PORT,
};
use crate::constants::{env, DEFAULT_SCHEME_MAX_BODY_BYTES};
use crate::discovery::CollectorSettings;
use crate::ssh::HostKeyPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP 监听地址
    pub listen_addr: String,
    /// 前端静态文件目录
    pub static_dir: PathBuf,
    pub tree_path: PathBuf,
    pub scheme_path: PathBuf,
    /// 主机登记表
    pub hosts_path: PathBuf,
    pub scheme_max_body_bytes: usize,
    pub discovery: DiscoverySettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            static_dir: PathBuf::from("./front"),
            tree_path: PathBuf::from("data/tree.json"),
            scheme_path: PathBuf::from("data/scheme.json"),
            hosts_path: PathBuf::from("data/discovery_hosts.json"),
            scheme_max_body_bytes: DEFAULT_SCHEME_MAX_BODY_BYTES,
            discovery: DiscoverySettings::default(),
        }
    }
}

/// 发现相关配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    /// 过程日志目录
    pub log_dir: PathBuf,
    pub ssh_port: u16,
    /// 单次发现的连接与执行超时（秒）
    pub connect_timeout_secs: u64,
    /// 整个 HTTP 请求的超时（秒）
    pub request_timeout_secs: u64,
    pub max_body_bytes: usize,
    pub max_output_bytes: usize,
    pub host_key_policy: HostKeyPolicy,
    /// pinned / trust_on_first_use 使用的指纹文件
    pub known_hosts_path: PathBuf,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs/discovery"),
            ssh_port: DEFAULT_SSH_PORT,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT.as_secs(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            host_key_policy: HostKeyPolicy::default(),
            known_hosts_path: PathBuf::from("data/known_hosts.json"),
        }
    }
}

impl DiscoverySettings {
    pub fn request_timeout(&self) -> Duration {
        if self.request_timeout_secs == 0 {
            DEFAULT_REQUEST_TIMEOUT
        } else {
            Duration::from_secs(self.request_timeout_secs)
        }
    }

    pub fn max_body_bytes(&self) -> usize {
        if self.max_body_bytes == 0 {
            DEFAULT_MAX_BODY_BYTES
        } else {
            self.max_body_bytes
        }
    }

    /// 采集器配置，0 值交给采集器补默认值
    pub fn collector_settings(&self) -> CollectorSettings {
        CollectorSettings {
            port: self.ssh_port,
            timeout: Duration::from_secs(self.connect_timeout_secs),
            log_dir: self.log_dir.clone(),
            max_output_bytes: self.max_output_bytes,
        }
    }
}

impl AppConfig {
    /// 从文件加载配置，文件不存在时返回默认配置
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(
                "[Config] {} not found, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
        let config: Self = serde_json::from_str(content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;

        info!("[Config] Loaded {}", path.display());
        Ok(config)
    }

    /// 应用环境变量覆盖
    pub fn apply_env(&mut self) {
        if let Ok(value) = std::env::var(env::SSH_PORT) {
            self.apply_ssh_port_override(&value);
        }
    }

    fn apply_ssh_port_override(&mut self, value: &str) {
        match value.trim().parse::<u16>() {
            Ok(port) if port > 0 => {
                info!("[Config] SSH port overridden to {} by {}", port, env::SSH_PORT);
                self.discovery.ssh_port = port;
            }
            _ => warn!(
                "[Config] Ignoring invalid {}={:?}",
                env::SSH_PORT,
                value
            ),
        }
    }
}

/// 配置文件路径：第一个命令行参数，其次是环境变量，最后是默认值
pub fn resolve_config_path(arg: Option<String>) -> PathBuf {
    arg.or_else(|| std::env::var(env::CONFIG_PATH).ok())
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("invhub.json"))
}
