// 远程事实采集
// 单次调用：打开日志 -> 构建认证 -> 拨号 -> 执行一条命令 -> 关闭连接 -> 关闭日志

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use tracing::{debug, error, info, warn};

use super::context::{DiscoveryContext, Interrupted};
use super::error::{CollectFailure, DiscoveryError};
use super::stage::DiscoveryStage;
use super::transcript::{Clock, TranscriptLog};
use crate::constants::discovery::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_SSH_PORT, FACTS_COMMAND,
};
use crate::models::DiscoveryHost;
use crate::ssh::{load_private_key, AuthMethod, Connection, Connector, SshConfig, SshError};

/// 断开连接的等待上限，超过后直接丢弃连接
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// 单次调用使用的凭据，调用结束即释放
#[derive(Clone, Default)]
pub struct SshAuth {
    pub login: String,
    pub password: String,
    /// 私钥文件路径
    pub key: Option<PathBuf>,
}

impl SshAuth {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
            key: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<PathBuf>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// 从登记表记录构建，空的 key 视为未配置
    pub fn from_host(host: &DiscoveryHost) -> Self {
        let key = host.key.trim();
        Self {
            login: host.login.clone(),
            password: host.password.clone(),
            key: (!key.is_empty()).then(|| PathBuf::from(key)),
        }
    }
}

impl fmt::Debug for SshAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshAuth")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("key", &self.key)
            .finish()
    }
}

/// 成功采集的结果
#[derive(Debug, Clone)]
pub struct CollectedFacts {
    /// 去掉首尾空白后的命令输出
    pub facts: String,
    pub log_file: PathBuf,
}

/// 采集器配置，0 值在构造时替换为默认值
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub port: u16,
    pub timeout: Duration,
    pub log_dir: PathBuf,
    pub max_output_bytes: usize,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_SSH_PORT,
            timeout: DEFAULT_CONNECT_TIMEOUT,
            log_dir: PathBuf::from("logs/discovery"),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

#[async_trait]
pub trait FactsCollector: Send + Sync {
    async fn collect_facts(
        &self,
        ctx: &DiscoveryContext,
        ip: &str,
        auth: &SshAuth,
    ) -> Result<CollectedFacts, CollectFailure>;
}

/// 基于 SSH 的事实采集器
pub struct SshFactsCollector {
    settings: CollectorSettings,
    connector: Arc<dyn Connector>,
    clock: Clock,
}

impl SshFactsCollector {
    pub fn new(mut settings: CollectorSettings, connector: Arc<dyn Connector>) -> Self {
        if settings.port == 0 {
            settings.port = DEFAULT_SSH_PORT;
        }
        if settings.timeout.is_zero() {
            settings.timeout = DEFAULT_CONNECT_TIMEOUT;
        }
        if settings.max_output_bytes == 0 {
            settings.max_output_bytes = DEFAULT_MAX_OUTPUT_BYTES;
        }

        Self {
            settings,
            connector,
            clock: Local::now,
        }
    }

    /// 替换日志时钟
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    async fn attempt(
        &self,
        ctx: &DiscoveryContext,
        ip: &str,
        auth: &SshAuth,
        log: &mut TranscriptLog,
        stage: &mut DiscoveryStage,
    ) -> Result<String, DiscoveryError> {
        log.line(format!("start discovery ip={}", ip));

        let config = match self.build_config(ip, auth).await {
            Ok(config) => config,
            Err(e) => {
                log.line(format!("ssh config error: {}", e));
                return Err(e);
            }
        };
        advance(ip, stage, DiscoveryStage::ConfigBuilt);

        log.line(format!(
            "dial ssh address={} user={} auth={}",
            config.address(),
            config.username,
            config.auth_names()
        ));

        // 拨号与执行共用同一个截止时间
        let attempt_ctx = ctx.with_timeout(self.settings.timeout);

        let connection = match settle(attempt_ctx.run(self.connector.connect(&config)).await) {
            Ok(connection) => connection,
            Err(e) => {
                log.line(format!("ssh dial failed: {}", e));
                return Err(DiscoveryError::Connection(e));
            }
        };
        advance(ip, stage, DiscoveryStage::Connected);

        match connection.server_key() {
            Some(key) => log.line(format!(
                "ssh connected server_key={} {}",
                key.key_type, key.fingerprint
            )),
            None => log.line("ssh connected"),
        }

        let result = self
            .execute(&attempt_ctx, ip, connection.as_ref(), log, stage)
            .await;

        if tokio::time::timeout(CLOSE_TIMEOUT, connection.close())
            .await
            .is_err()
        {
            warn!("[Discovery] Closing connection to {} timed out", ip);
        }

        let facts = result?;
        log.line(format!("done discovery ip={}", ip));
        Ok(facts)
    }

    async fn execute(
        &self,
        ctx: &DiscoveryContext,
        ip: &str,
        connection: &dyn Connection,
        log: &mut TranscriptLog,
        stage: &mut DiscoveryStage,
    ) -> Result<String, DiscoveryError> {
        let session = match settle(ctx.run(connection.open_exec()).await) {
            Ok(session) => session,
            Err(e) => {
                log.line(format!("ssh session failed: {}", e));
                return Err(DiscoveryError::Command(e));
            }
        };
        advance(ip, stage, DiscoveryStage::SessionOpened);

        log.line(format!("exec command={:?}", FACTS_COMMAND));
        let max_output = self.settings.max_output_bytes;
        let output = match settle(ctx.run(session.exec(FACTS_COMMAND, max_output)).await) {
            Ok(output) => output,
            Err(e) => {
                log.line(format!("command failed: {}", e));
                return Err(DiscoveryError::Command(e));
            }
        };
        advance(ip, stage, DiscoveryStage::Executed);

        if output.is_truncated() {
            log.line(format!(
                "output truncated at {} bytes ({} bytes discarded)",
                max_output, output.discarded
            ));
        }

        let text = output.trimmed();
        if let Err(e) = output.check() {
            log.line(format!("command failed: {}", e));
            log.line(format!("command output:\n{}", text));
            return Err(DiscoveryError::Command(e));
        }

        log.line(format!("command output:\n{}", text));
        Ok(text)
    }

    async fn build_config(&self, ip: &str, auth: &SshAuth) -> Result<SshConfig, DiscoveryError> {
        if auth.login.is_empty() {
            return Err(DiscoveryError::MissingCredential("login"));
        }
        if auth.password.is_empty() {
            return Err(DiscoveryError::MissingCredential("password"));
        }

        // 密码优先，私钥其次
        let mut methods = vec![AuthMethod::Password(auth.password.clone())];
        if let Some(key_path) = &auth.key {
            let key = load_private_key(key_path)
                .await
                .map_err(DiscoveryError::Key)?;
            methods.push(AuthMethod::PublicKey {
                key_path: key_path.clone(),
                key: Arc::new(key),
            });
        }

        Ok(SshConfig {
            host: ip.to_string(),
            port: self.settings.port,
            username: auth.login.clone(),
            auth: methods,
            connect_timeout: self.settings.timeout,
        })
    }
}

#[async_trait]
impl FactsCollector for SshFactsCollector {
    async fn collect_facts(
        &self,
        ctx: &DiscoveryContext,
        ip: &str,
        auth: &SshAuth,
    ) -> Result<CollectedFacts, CollectFailure> {
        let mut stage = DiscoveryStage::Init;

        let mut log = match TranscriptLog::create(&self.settings.log_dir, self.clock) {
            Ok(log) => log,
            Err(e) => {
                error!(
                    "[Discovery] Failed to open log in {}: {}",
                    self.settings.log_dir.display(),
                    e
                );
                return Err(CollectFailure {
                    log_file: None,
                    error: DiscoveryError::LogInit(e),
                });
            }
        };
        advance(ip, &mut stage, DiscoveryStage::LogOpened);
        let log_file = log.path().to_path_buf();

        let result = self.attempt(ctx, ip, auth, &mut log, &mut stage).await;
        log.close();

        match result {
            Ok(facts) => {
                advance(ip, &mut stage, DiscoveryStage::Success);
                info!("[Discovery] Collected facts from {}", ip);
                Ok(CollectedFacts { facts, log_file })
            }
            Err(error) => {
                advance(ip, &mut stage, DiscoveryStage::Failed);
                warn!(
                    "[Discovery] Discovery of {} failed: {} (log: {})",
                    ip,
                    error,
                    log_file.display()
                );
                Err(CollectFailure {
                    log_file: Some(log_file),
                    error,
                })
            }
        }
    }
}

fn advance(ip: &str, stage: &mut DiscoveryStage, to: DiscoveryStage) {
    debug_assert!(stage.can_transition(to), "{:?} -> {:?}", stage, to);
    debug!("[Discovery] {}: {} -> {}", ip, stage.label(), to.label());
    *stage = to;
}

/// 把上下文中断折叠进 SSH 错误
fn settle<T>(result: Result<Result<T, SshError>, Interrupted>) -> Result<T, SshError> {
    match result {
        Ok(inner) => inner,
        Err(Interrupted::Cancelled) => Err(SshError::Cancelled),
        Err(Interrupted::DeadlineExceeded(budget)) => Err(SshError::Timeout(budget)),
    }
}
