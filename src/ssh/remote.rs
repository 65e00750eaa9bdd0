// 远程 Shell 抽象
// 发现流程只依赖这些 trait，测试可以用模拟端点替换真实的 russh 连接

use async_trait::async_trait;

use super::config::SshConfig;
use super::error::SshError;

/// 服务器公钥信息（握手时记录）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerKey {
    pub key_type: String,
    pub fingerprint: String,
}

/// 建立已认证连接
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &SshConfig) -> Result<Box<dyn Connection>, SshError>;
}

/// 已认证的 SSH 连接
#[async_trait]
pub trait Connection: Send + Sync {
    /// 握手时看到的服务器公钥
    fn server_key(&self) -> Option<&ServerKey>;

    /// 打开一个只能执行一条命令的会话
    async fn open_exec(&self) -> Result<Box<dyn ExecSession>, SshError>;

    /// 断开连接
    async fn close(self: Box<Self>);
}

/// 一次性执行会话，执行后即被消耗
#[async_trait]
pub trait ExecSession: Send {
    /// 执行命令，stdout 与 stderr 按到达顺序合并，最多保留 `max_output` 字节
    async fn exec(
        self: Box<Self>,
        command: &str,
        max_output: usize,
    ) -> Result<CommandOutput, SshError>;
}

/// 命令输出
#[derive(Debug, Default, Clone)]
pub struct CommandOutput {
    /// 合并后的标准输出与标准错误
    pub output: Vec<u8>,
    /// 退出码
    pub exit_status: Option<u32>,
    /// 终止信号
    pub exit_signal: Option<String>,
    /// 超出上限被丢弃的字节数
    pub discarded: usize,
}

impl CommandOutput {
    /// 追加数据，超出上限的部分丢弃并计数
    pub fn append(&mut self, data: &[u8], max_output: usize) {
        let room = max_output.saturating_sub(self.output.len());
        let take = room.min(data.len());
        self.output.extend_from_slice(&data[..take]);
        self.discarded += data.len() - take;
    }

    pub fn is_truncated(&self) -> bool {
        self.discarded > 0
    }

    /// 去掉首尾空白后的输出
    pub fn trimmed(&self) -> String {
        String::from_utf8_lossy(&self.output).trim().to_string()
    }

    /// 按退出状态判断成功与否
    pub fn check(&self) -> Result<(), SshError> {
        if let Some(signal) = &self.exit_signal {
            return Err(SshError::ExitSignal(signal.clone()));
        }
        match self.exit_status {
            Some(0) => Ok(()),
            Some(code) => Err(SshError::ExitStatus(code)),
            None => Err(SshError::MissingExitStatus),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_respects_cap() {
        let mut out = CommandOutput::default();
        out.append(b"hello ", 8);
        out.append(b"world", 8);
        assert_eq!(out.output, b"hello wo");
        assert_eq!(out.discarded, 3);
        assert!(out.is_truncated());
    }

    #[test]
    fn test_check_exit_states() {
        let mut out = CommandOutput::default();
        assert!(matches!(out.check(), Err(SshError::MissingExitStatus)));

        out.exit_status = Some(0);
        assert!(out.check().is_ok());

        out.exit_status = Some(1);
        assert!(matches!(out.check(), Err(SshError::ExitStatus(1))));

        out.exit_signal = Some("KILL".to_string());
        assert!(matches!(out.check(), Err(SshError::ExitSignal(_))));
    }

    #[test]
    fn test_trimmed() {
        let out = CommandOutput {
            output: b"\n  NAME=\"TestOS\"\n\n".to_vec(),
            ..Default::default()
        };
        assert_eq!(out.trimmed(), "NAME=\"TestOS\"");
    }
}
