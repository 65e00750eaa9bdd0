// SSH 连接模块
//
// 模块结构:
// - config: 连接配置 (SshConfig, AuthMethod, HostKeyPolicy)
// - error: 错误类型 (SshError)
// - handler: russh Handler 实现与主机密钥校验
// - client: SSH 客户端核心（拨号、握手、认证）
// - session: SSH 会话与一次性执行通道
// - remote: 发现流程依赖的连接抽象

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod remote;
pub mod session;

// 公开导出
pub use client::SshClient;
pub use config::{load_private_key, AuthMethod, HostKeyPolicy, SshConfig};
pub use error::SshError;
pub use handler::{HostKeyVerdict, HostKeyVerifier};
pub use remote::{CommandOutput, Connection, Connector, ExecSession, ServerKey};
pub use session::{ExecChannel, SshSession};
