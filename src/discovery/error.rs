// 发现流程错误类型

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::ssh::SshError;

/// 发现错误分类
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// 登记表缺少登录名或密码
    #[error("missing ssh {0} in hosts file")]
    MissingCredential(&'static str),

    /// 私钥无法读取或解析
    #[error("failed to load ssh key: {0}")]
    Key(#[source] SshError),

    /// 无法创建日志文件
    #[error("failed to open discovery log: {0}")]
    LogInit(#[source] io::Error),

    /// 拨号、握手、主机密钥、认证失败，含超时与取消
    #[error("ssh dial failed: {0}")]
    Connection(#[source] SshError),

    /// 非零退出或执行期间的传输错误
    #[error("ssh command failed: {0}")]
    Command(#[source] SshError),
}

impl DiscoveryError {
    /// 配置类错误（凭据缺失、私钥不可用）
    pub fn is_config(&self) -> bool {
        matches!(self, Self::MissingCredential(_) | Self::Key(_))
    }

    pub fn is_timeout(&self) -> bool {
        self.ssh_error().is_some_and(SshError::is_timeout)
    }

    pub fn is_cancelled(&self) -> bool {
        self.ssh_error().is_some_and(SshError::is_cancelled)
    }

    fn ssh_error(&self) -> Option<&SshError> {
        match self {
            Self::Key(e) | Self::Connection(e) | Self::Command(e) => Some(e),
            Self::MissingCredential(_) | Self::LogInit(_) => None,
        }
    }
}

/// 一次失败的发现
/// 只有日志无法创建时 log_file 才为 None
#[derive(Debug, Error)]
#[error("{error}")]
pub struct CollectFailure {
    pub log_file: Option<PathBuf>,
    #[source]
    pub error: DiscoveryError,
}
