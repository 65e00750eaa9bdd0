// 全局 AppState
// 所有处理器共享的协作者与限额，构造后只读

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::AppConfig;
use crate::discovery::{FactsCollector, SshFactsCollector};
use crate::services::storage::{
    DiscoveryHostsRepository, HostRegistry, KnownHostsStore, SchemeRepository, SchemeStore,
    TreeReader, TreeRepository,
};
use crate::ssh::{HostKeyPolicy, HostKeyVerifier, SshClient};

/// 请求限额
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// 发现请求体上限
    pub discovery_body_bytes: usize,
    /// 方案图请求体上限
    pub scheme_body_bytes: usize,
    /// 发现请求整体超时
    pub request_timeout: Duration,
}

#[derive(Clone)]
pub struct AppState {
    pub collector: Arc<dyn FactsCollector>,
    pub hosts: Arc<dyn HostRegistry>,
    pub schemes: Arc<dyn SchemeStore>,
    pub tree: Arc<dyn TreeReader>,
    pub limits: Limits,
}

impl AppState {
    /// 按配置组装真实的 SSH 采集器和 JSON 文件存储
    pub fn from_config(config: &AppConfig) -> Self {
        let discovery = &config.discovery;

        let verifier = match discovery.host_key_policy {
            HostKeyPolicy::AcceptAny => HostKeyVerifier::accept_any(),
            policy => HostKeyVerifier::new(
                policy,
                Arc::new(KnownHostsStore::new(&discovery.known_hosts_path)),
            ),
        };
        info!(
            "[Discovery] Host key policy: {:?}",
            discovery.host_key_policy
        );

        let client = SshClient::new(Arc::new(verifier));
        let collector = SshFactsCollector::new(discovery.collector_settings(), Arc::new(client));

        Self::with_collector(config, Arc::new(collector))
    }

    /// 使用指定的采集器，存储仍按配置路径创建
    pub fn with_collector(config: &AppConfig, collector: Arc<dyn FactsCollector>) -> Self {
        Self {
            collector,
            hosts: Arc::new(DiscoveryHostsRepository::new(&config.hosts_path)),
            schemes: Arc::new(SchemeRepository::new(&config.scheme_path)),
            tree: Arc::new(TreeRepository::new(&config.tree_path)),
            limits: Limits {
                discovery_body_bytes: config.discovery.max_body_bytes(),
                scheme_body_bytes: config.scheme_max_body_bytes,
                request_timeout: config.discovery.request_timeout(),
            },
        }
    }
}
