// 数据模型模块

pub mod discovery;
pub mod known_hosts;
pub mod scheme;

pub use discovery::{find_host_by_ip, DiscoveryHost, DiscoveryHostPublic};
pub use known_hosts::{KnownHost, KnownHostsConfig};
pub use scheme::{Scheme, TreeData};
