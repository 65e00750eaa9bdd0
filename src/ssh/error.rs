// SSH 错误类型定义

use std::time::Duration;

use thiserror::Error;

/// SSH 错误类型
#[derive(Debug, Error)]
pub enum SshError {
    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO 错误（网络连接等）
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 认证失败
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// SSH 协议错误
    #[error("SSH protocol error: {0}")]
    Protocol(String),

    /// 密钥错误
    #[error("Key error: {0}")]
    Key(String),

    /// 主机密钥校验未通过
    #[error("Host key rejected: {0}")]
    HostKey(String),

    /// 超时
    #[error("Timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// 通道错误
    #[error("Channel error: {0}")]
    Channel(String),

    /// 远程命令以非零状态退出
    #[error("Process exited with status {0}")]
    ExitStatus(u32),

    /// 远程命令被信号终止
    #[error("Process terminated by signal {0}")]
    ExitSignal(String),

    /// 通道关闭但没有收到退出状态
    #[error("Remote command exited without exit status")]
    MissingExitStatus,

    /// 已取消
    #[error("Cancelled")]
    Cancelled,
}

impl SshError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SshError::Timeout(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SshError::Cancelled)
    }
}

impl From<russh::Error> for SshError {
    fn from(e: russh::Error) -> Self {
        SshError::Protocol(e.to_string())
    }
}

impl From<russh::keys::Error> for SshError {
    fn from(e: russh::keys::Error) -> Self {
        SshError::Key(e.to_string())
    }
}
