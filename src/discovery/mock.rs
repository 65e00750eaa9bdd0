// 模拟 SSH 端点
// 不连接真实主机即可驱动发现流程，用于开发和测试

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::ssh::{CommandOutput, Connection, Connector, ExecSession, ServerKey, SshConfig, SshError};

/// 模拟端点的行为
#[derive(Clone, Debug)]
pub enum MockBehavior {
    /// 正常执行命令，返回给定输出和退出码
    Respond { output: String, exit_status: u32 },
    /// 拒绝认证
    RejectAuth,
    /// 拨号阶段一直挂起
    HangOnConnect,
    /// 命令执行阶段一直挂起
    HangOnExec,
}

/// 记录到的一次拨号
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DialRecord {
    pub address: String,
    pub username: String,
    /// 认证方式名称，按尝试顺序
    pub auth: Vec<&'static str>,
}

/// 模拟连接器
pub struct MockConnector {
    behavior: MockBehavior,
    attempts: AtomicUsize,
    dials: Mutex<Vec<DialRecord>>,
    commands: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicUsize>,
}

impl MockConnector {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            attempts: AtomicUsize::new(0),
            dials: Mutex::new(Vec::new()),
            commands: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 以给定输出和退出码响应
    pub fn respond(output: impl Into<String>, exit_status: u32) -> Self {
        Self::new(MockBehavior::Respond {
            output: output.into(),
            exit_status,
        })
    }

    /// 拨号次数
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// 显式 close 的连接数（仅被 drop 的连接不计入）
    pub fn closed_connections(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn dials(&self) -> Vec<DialRecord> {
        self.dials.lock().map(|d| d.clone()).unwrap_or_default()
    }

    /// 执行过的命令
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, config: &SshConfig) -> Result<Box<dyn Connection>, SshError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut dials) = self.dials.lock() {
            dials.push(DialRecord {
                address: config.address(),
                username: config.username.clone(),
                auth: config.auth.iter().map(|m| m.name()).collect(),
            });
        }

        match &self.behavior {
            MockBehavior::HangOnConnect => std::future::pending().await,
            MockBehavior::RejectAuth => Err(SshError::Auth(format!(
                "all methods rejected for user '{}' (password)",
                config.username
            ))),
            behavior => Ok(Box::new(MockConnection {
                behavior: behavior.clone(),
                commands: self.commands.clone(),
                closed: self.closed.clone(),
                server_key: ServerKey {
                    key_type: "ssh-ed25519".to_string(),
                    fingerprint: "SHA256:mock".to_string(),
                },
            })),
        }
    }
}

struct MockConnection {
    behavior: MockBehavior,
    commands: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicUsize>,
    server_key: ServerKey,
}

#[async_trait]
impl Connection for MockConnection {
    fn server_key(&self) -> Option<&ServerKey> {
        Some(&self.server_key)
    }

    async fn open_exec(&self) -> Result<Box<dyn ExecSession>, SshError> {
        Ok(Box::new(MockExec {
            behavior: self.behavior.clone(),
            commands: self.commands.clone(),
        }))
    }

    async fn close(self: Box<Self>) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

struct MockExec {
    behavior: MockBehavior,
    commands: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ExecSession for MockExec {
    async fn exec(
        self: Box<Self>,
        command: &str,
        max_output: usize,
    ) -> Result<CommandOutput, SshError> {
        let this = *self;
        if let Ok(mut commands) = this.commands.lock() {
            commands.push(command.to_string());
        }

        match this.behavior {
            MockBehavior::Respond {
                output,
                exit_status,
            } => {
                let mut result = CommandOutput::default();
                result.append(output.as_bytes(), max_output);
                result.exit_status = Some(exit_status);
                Ok(result)
            }
            _ => std::future::pending().await,
        }
    }
}
