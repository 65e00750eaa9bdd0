// SSH 客户端核心实现

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use russh::client::{AuthResult, Handle};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info};

use super::config::{AuthMethod, SshConfig};
use super::error::SshError;
use super::handler::{HostKeyVerifier, SshClientHandler};
use super::remote::{Connection, Connector};
use super::session::SshSession;

/// SSH 客户端
/// 负责建立 SSH 连接并返回 SshSession
#[derive(Clone)]
pub struct SshClient {
    verifier: Arc<HostKeyVerifier>,
}

impl SshClient {
    /// 创建新的 SSH 客户端
    pub fn new(verifier: Arc<HostKeyVerifier>) -> Self {
        Self { verifier }
    }

    /// 执行连接：TCP -> 握手 -> 认证
    pub async fn establish(&self, config: &SshConfig) -> Result<SshSession, SshError> {
        if config.auth.is_empty() {
            return Err(SshError::Config("no authentication method".to_string()));
        }

        debug!(
            "[SSH] Target: {}@{}",
            config.username,
            config.address()
        );

        // 阶段 1: TCP 连接
        let connect_timeout = config.connect_timeout;
        let tcp_stream = timeout(
            connect_timeout,
            TcpStream::connect((config.host.as_str(), config.port)),
        )
        .await
        .map_err(|_| SshError::Timeout(connect_timeout))?
        .map_err(SshError::Io)?;

        debug!("[SSH] TCP connection established to {}", config.address());

        // 阶段 2: SSH 握手
        let russh_config = Arc::new(config.to_russh_config());
        let observed = Arc::new(Mutex::new(None));
        let handler = SshClientHandler::new(
            config.host.clone(),
            config.port,
            self.verifier.clone(),
            observed.clone(),
        );

        let mut handle = timeout(
            connect_timeout,
            russh::client::connect_stream(russh_config, tcp_stream, handler),
        )
        .await
        .map_err(|_| SshError::Timeout(connect_timeout))??;

        debug!("[SSH] SSH handshake completed");

        // 阶段 3: 认证
        timeout(connect_timeout, self.authenticate(&mut handle, config))
            .await
            .map_err(|_| SshError::Timeout(connect_timeout))??;

        info!(
            "[SSH] Authenticated as '{}' on {}",
            config.username,
            config.address()
        );

        let server_key = observed.lock().ok().and_then(|mut slot| slot.take());
        Ok(SshSession::new(handle, config.address(), server_key))
    }

    /// 按顺序尝试认证方式，任一成功即返回
    async fn authenticate(
        &self,
        handle: &mut Handle<SshClientHandler>,
        config: &SshConfig,
    ) -> Result<(), SshError> {
        let mut failures = Vec::new();

        for method in &config.auth {
            let auth_result = match method {
                AuthMethod::Password(password) => {
                    debug!("[SSH] Trying password authentication");
                    handle
                        .authenticate_password(&config.username, password)
                        .await
                        .map_err(SshError::from)?
                }
                AuthMethod::PublicKey { key_path, key } => {
                    debug!("[SSH] Trying public key authentication: {:?}", key_path);
                    let key_with_alg = russh::keys::PrivateKeyWithHashAlg::new(key.clone(), None);
                    handle
                        .authenticate_publickey(&config.username, key_with_alg)
                        .await
                        .map_err(SshError::from)?
                }
            };

            match auth_result {
                AuthResult::Success => return Ok(()),
                AuthResult::Failure {
                    remaining_methods, ..
                } => {
                    debug!(
                        "[SSH] {} authentication rejected, server suggests: {:?}",
                        method.name(),
                        remaining_methods
                    );
                    failures.push(method.name());
                }
            }
        }

        Err(SshError::Auth(format!(
            "all methods rejected for user '{}' ({})",
            config.username,
            failures.join(", ")
        )))
    }
}

#[async_trait]
impl Connector for SshClient {
    async fn connect(&self, config: &SshConfig) -> Result<Box<dyn Connection>, SshError> {
        let session = self.establish(config).await?;
        Ok(Box::new(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::net::TcpListener;

    fn config(port: u16, connect_timeout: Duration) -> SshConfig {
        SshConfig {
            host: "127.0.0.1".to_string(),
            port,
            username: "admin".to_string(),
            auth: vec![AuthMethod::Password("secret".to_string())],
            connect_timeout,
        }
    }

    #[tokio::test]
    async fn test_connect_refused_is_io_error() {
        // 先占用端口再释放，保证此端口上无人监听
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = SshClient::new(Arc::new(HostKeyVerifier::accept_any()));
        let err = client
            .establish(&config(port, Duration::from_secs(2)))
            .await
            .unwrap_err();
        assert!(matches!(err, SshError::Io(_)), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        // 接受 TCP 连接但从不发送 SSH 版本号
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accept = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let client = SshClient::new(Arc::new(HostKeyVerifier::accept_any()));
        let started = std::time::Instant::now();
        let err = client
            .establish(&config(port, Duration::from_millis(300)))
            .await
            .unwrap_err();
        assert!(err.is_timeout(), "unexpected error: {err}");
        assert!(started.elapsed() < Duration::from_secs(3));
        accept.abort();
    }

    #[tokio::test]
    async fn test_no_auth_methods_is_config_error() {
        let client = SshClient::new(Arc::new(HostKeyVerifier::accept_any()));
        let mut cfg = config(22, Duration::from_secs(1));
        cfg.auth.clear();
        let err = client.establish(&cfg).await.unwrap_err();
        assert!(matches!(err, SshError::Config(_)));
    }
}
