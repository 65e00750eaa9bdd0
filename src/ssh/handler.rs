// SSH 客户端 Handler 实现
// 实现 russh::client::Handler trait，并按策略校验主机密钥

use std::future::Future;
use std::sync::{Arc, Mutex};

use russh::keys::PublicKey;
use tracing::{debug, info, warn};

use super::config::{join_host_port, HostKeyPolicy};
use super::error::SshError;
use super::remote::ServerKey;
use crate::models::KnownHost;
use crate::services::storage::KnownHostsStore;

/// 校验结果
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostKeyVerdict {
    /// 未校验直接接受
    Accepted,
    /// 与 known_hosts 一致
    Matched,
    /// 首次连接，已记录
    Recorded,
}

/// 主机密钥校验器
pub struct HostKeyVerifier {
    policy: HostKeyPolicy,
    store: Option<Arc<KnownHostsStore>>,
}

impl HostKeyVerifier {
    /// 接受任意主机密钥
    pub fn accept_any() -> Self {
        Self {
            policy: HostKeyPolicy::AcceptAny,
            store: None,
        }
    }

    pub fn new(policy: HostKeyPolicy, store: Arc<KnownHostsStore>) -> Self {
        Self {
            policy,
            store: Some(store),
        }
    }

    pub fn policy(&self) -> HostKeyPolicy {
        self.policy
    }

    /// 按策略校验
    pub fn verify(
        &self,
        host: &str,
        port: u16,
        key: &ServerKey,
    ) -> Result<HostKeyVerdict, SshError> {
        let store = match (self.policy, &self.store) {
            (HostKeyPolicy::AcceptAny, _) => return Ok(HostKeyVerdict::Accepted),
            (_, Some(store)) => store,
            (_, None) => {
                return Err(SshError::Config(
                    "host key policy requires a known_hosts store".to_string(),
                ))
            }
        };

        let address = join_host_port(host, port);

        // pinned 只读，不改写文件
        if self.policy == HostKeyPolicy::Pinned {
            let config = store
                .load()
                .map_err(|e| SshError::Config(format!("known_hosts store: {}", e)))?;
            return match config.find(&address) {
                Some(known) if known.fingerprint == key.fingerprint => Ok(HostKeyVerdict::Matched),
                Some(known) => Err(fingerprint_changed(&address, &known.fingerprint, key)),
                None => Err(SshError::HostKey(format!(
                    "{} is not in {:?} ({})",
                    address,
                    store.path(),
                    key.fingerprint
                ))),
            };
        }

        let now = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();
        store
            .update(|config| match config.find_mut(&address) {
                Some(known) if known.fingerprint == key.fingerprint => {
                    known.last_used = now.clone();
                    Ok(HostKeyVerdict::Matched)
                }
                Some(known) => Err(fingerprint_changed(&address, &known.fingerprint, key)),
                None => {
                    config.hosts.push(KnownHost {
                        host: address.clone(),
                        key_type: key.key_type.clone(),
                        fingerprint: key.fingerprint.clone(),
                        first_seen: now.clone(),
                        last_used: now.clone(),
                    });
                    Ok(HostKeyVerdict::Recorded)
                }
            })
            .map_err(|e| SshError::Config(format!("known_hosts store: {}", e)))?
    }
}

fn fingerprint_changed(address: &str, expected: &str, key: &ServerKey) -> SshError {
    SshError::HostKey(format!(
        "fingerprint for {} changed: expected {}, got {}",
        address, expected, key.fingerprint
    ))
}

/// SSH 客户端 Handler
/// 处理 SSH 连接过程中的各种回调
pub struct SshClientHandler {
    host: String,
    port: u16,
    verifier: Arc<HostKeyVerifier>,
    /// 握手时看到的服务器公钥，连接建立后交给会话
    observed: Arc<Mutex<Option<ServerKey>>>,
}

impl SshClientHandler {
    /// 创建新的 Handler
    pub fn new(
        host: String,
        port: u16,
        verifier: Arc<HostKeyVerifier>,
        observed: Arc<Mutex<Option<ServerKey>>>,
    ) -> Self {
        Self {
            host,
            port,
            verifier,
            observed,
        }
    }
}

impl russh::client::Handler for SshClientHandler {
    type Error = SshError;

    /// 检查服务器公钥
    fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send {
        let key = ServerKey {
            key_type: server_public_key.algorithm().to_string(),
            fingerprint: server_public_key
                .fingerprint(russh::keys::ssh_key::HashAlg::Sha256)
                .to_string(),
        };

        debug!(
            "[SSH] Server key for {}: {} {}",
            self.host, key.key_type, key.fingerprint
        );

        if let Ok(mut slot) = self.observed.lock() {
            *slot = Some(key.clone());
        }

        let verifier = self.verifier.clone();
        let host = self.host.clone();
        let port = self.port;
        async move {
            // known_hosts 读写是阻塞文件 IO，放到 blocking 线程池
            let result = if verifier.policy() == HostKeyPolicy::AcceptAny {
                Ok(HostKeyVerdict::Accepted)
            } else {
                let task_host = host.clone();
                tokio::task::spawn_blocking(move || verifier.verify(&task_host, port, &key))
                    .await
                    .map_err(|e| SshError::Config(format!("host key check aborted: {}", e)))?
            };

            match &result {
                Ok(HostKeyVerdict::Recorded) => info!("[SSH] Trusted {} on first use", host),
                Ok(_) => {}
                Err(e) => warn!("[SSH] Rejected server key for {}: {}", host, e),
            }
            result.map(|_| true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key(fp: &str) -> ServerKey {
        ServerKey {
            key_type: "ssh-ed25519".to_string(),
            fingerprint: fp.to_string(),
        }
    }

    fn store(dir: &TempDir) -> Arc<KnownHostsStore> {
        Arc::new(KnownHostsStore::new(dir.path().join("known_hosts.json")))
    }

    #[test]
    fn test_accept_any_skips_store() {
        let verifier = HostKeyVerifier::accept_any();
        let verdict = verifier.verify("10.0.0.1", 22, &key("SHA256:x")).unwrap();
        assert_eq!(verdict, HostKeyVerdict::Accepted);
    }

    #[test]
    fn test_pinned_rejects_unknown_host() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let verifier = HostKeyVerifier::new(HostKeyPolicy::Pinned, store.clone());
        let err = verifier
            .verify("10.0.0.1", 22, &key("SHA256:x"))
            .unwrap_err();
        assert!(matches!(err, SshError::HostKey(_)));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_pinned_accepts_known_fingerprint() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store
            .upsert(KnownHost {
                host: "10.0.0.1:22".to_string(),
                key_type: "ssh-ed25519".to_string(),
                fingerprint: "SHA256:x".to_string(),
                first_seen: String::new(),
                last_used: String::new(),
            })
            .unwrap();

        let verifier = HostKeyVerifier::new(HostKeyPolicy::Pinned, store.clone());
        let verdict = verifier.verify("10.0.0.1", 22, &key("SHA256:x")).unwrap();
        assert_eq!(verdict, HostKeyVerdict::Matched);
        // pinned 校验不改写文件
        assert!(store.load().unwrap().hosts[0].last_used.is_empty());
    }

    #[test]
    fn test_trust_on_first_use_records_then_detects_change() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let verifier = HostKeyVerifier::new(HostKeyPolicy::TrustOnFirstUse, store.clone());

        let first = verifier.verify("fe80::1", 2222, &key("SHA256:a")).unwrap();
        assert_eq!(first, HostKeyVerdict::Recorded);
        assert_eq!(store.load().unwrap().hosts[0].host, "[fe80::1]:2222");

        let again = verifier.verify("fe80::1", 2222, &key("SHA256:a")).unwrap();
        assert_eq!(again, HostKeyVerdict::Matched);

        let err = verifier
            .verify("fe80::1", 2222, &key("SHA256:b"))
            .unwrap_err();
        assert!(err.to_string().contains("changed"));
    }
}
