// 基于 russh 的 Connection / ExecSession 实现
// 每个执行通道只跑一条命令

use std::fmt;

use async_trait::async_trait;
use russh::client::{Handle, Msg};
use russh::ChannelMsg;
use tracing::debug;

use super::error::SshError;
use super::handler::SshClientHandler;
use super::remote::{CommandOutput, Connection, ExecSession, ServerKey};

/// 已认证的 SSH 连接
pub struct SshSession {
    handle: Handle<SshClientHandler>,
    /// host:port，写日志用
    address: String,
    server_key: Option<ServerKey>,
}

impl SshSession {
    pub fn new(
        handle: Handle<SshClientHandler>,
        address: String,
        server_key: Option<ServerKey>,
    ) -> Self {
        Self {
            handle,
            address,
            server_key,
        }
    }
}

// 只输出地址和公钥，不含连接句柄
impl fmt::Debug for SshSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshSession")
            .field("address", &self.address)
            .field("server_key", &self.server_key)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Connection for SshSession {
    fn server_key(&self) -> Option<&ServerKey> {
        self.server_key.as_ref()
    }

    async fn open_exec(&self) -> Result<Box<dyn ExecSession>, SshError> {
        let channel = self.handle.channel_open_session().await?;
        debug!("[SSH] Opened exec channel on {}", self.address);
        Ok(Box::new(ExecChannel { channel }))
    }

    async fn close(self: Box<Self>) {
        let result = self
            .handle
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await;
        match result {
            Ok(()) => debug!("[SSH] Disconnected from {}", self.address),
            Err(e) => debug!("[SSH] Disconnect from {} failed: {}", self.address, e),
        }
    }
}

/// 一次性执行通道，exec 之后即被消耗
pub struct ExecChannel {
    channel: russh::Channel<Msg>,
}

#[async_trait]
impl ExecSession for ExecChannel {
    async fn exec(
        self: Box<Self>,
        command: &str,
        max_output: usize,
    ) -> Result<CommandOutput, SshError> {
        let mut channel = self.channel;

        if let Err(e) = channel.exec(true, command).await {
            return Err(SshError::Channel(format!("exec request failed: {}", e)));
        }

        let mut output = CommandOutput::default();

        // exit-status 可能在 EOF 之后才到，读到 Close 为止
        while let Some(channel_msg) = channel.wait().await {
            match channel_msg {
                ChannelMsg::Data { data } => output.append(&data, max_output),
                ChannelMsg::ExtendedData { data, .. } => output.append(&data, max_output),
                ChannelMsg::ExitStatus { exit_status } => output.exit_status = Some(exit_status),
                ChannelMsg::ExitSignal { signal_name, .. } => {
                    output.exit_signal = Some(format!("{:?}", signal_name));
                }
                ChannelMsg::Failure => {
                    return Err(SshError::Channel("exec request rejected".to_string()));
                }
                ChannelMsg::Close => break,
                _ => {}
            }
        }

        let _ = channel.close().await;
        Ok(output)
    }
}
