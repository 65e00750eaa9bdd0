// 主机公钥指纹记录
// pinned 策略只读，trust_on_first_use 策略首次连接时追加

use serde::{Deserialize, Serialize};

/// 一台主机的已信任公钥
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct KnownHost {
    /// host:port，IPv6 带方括号
    pub host: String,
    pub key_type: String,
    /// SHA256 指纹
    pub fingerprint: String,
    #[serde(default)]
    pub first_seen: String,
    #[serde(default)]
    pub last_used: String,
}

/// known_hosts 文件内容
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KnownHostsConfig {
    pub hosts: Vec<KnownHost>,
}

impl KnownHostsConfig {
    pub fn find(&self, host: &str) -> Option<&KnownHost> {
        self.hosts.iter().find(|h| h.host == host)
    }

    pub fn find_mut(&mut self, host: &str) -> Option<&mut KnownHost> {
        self.hosts.iter_mut().find(|h| h.host == host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hand_written_pin_parses() {
        // 手工固定的条目可以省略时间字段
        let config: KnownHostsConfig = serde_json::from_str(
            r#"{"hosts":[{"host":"10.0.0.1:22","key_type":"ssh-ed25519","fingerprint":"SHA256:abc"}]}"#,
        )
        .unwrap();

        let entry = config.find("10.0.0.1:22").unwrap();
        assert_eq!(entry.fingerprint, "SHA256:abc");
        assert!(entry.first_seen.is_empty());
        assert!(config.find("10.0.0.1:2222").is_none());
    }
}
