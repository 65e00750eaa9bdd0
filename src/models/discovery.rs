// 发现主机数据结构

use std::fmt;

use serde::{Deserialize, Serialize};

/// 主机登记表中的一条记录（持久化用）
///
/// 记录由外部维护，发现流程只读。
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiscoveryHost {
    pub id: i64,
    pub fqdn: String,
    pub ip: String,
    /// 自由格式的状态标签，发现流程不修改
    pub status: String,
    pub login: String,
    pub key: String,
    pub password: String,
}

// 密码不进入任何日志
impl fmt::Debug for DiscoveryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveryHost")
            .field("id", &self.id)
            .field("fqdn", &self.fqdn)
            .field("ip", &self.ip)
            .field("status", &self.status)
            .field("login", &self.login)
            .field("key", &self.key)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl DiscoveryHost {
    /// 对外公开的投影，不含任何凭据
    pub fn public_view(&self) -> DiscoveryHostPublic {
        DiscoveryHostPublic {
            id: self.id,
            fqdn: self.fqdn.clone(),
            ip: self.ip.clone(),
            status: self.status.clone(),
        }
    }
}

/// 主机列表接口返回的公开字段
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DiscoveryHostPublic {
    pub id: i64,
    pub fqdn: String,
    pub ip: String,
    pub status: String,
}

/// 在登记表中按 IP 精确查找
pub fn find_host_by_ip<'a>(hosts: &'a [DiscoveryHost], ip: &str) -> Option<&'a DiscoveryHost> {
    hosts.iter().find(|h| h.ip == ip)
}
