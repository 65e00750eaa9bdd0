// 本地数据持久化服务
// 菜单树、方案图、主机登记表、known_hosts 都以 JSON 文件保存

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::models::{DiscoveryHost, KnownHost, KnownHostsConfig, Scheme, TreeData};

/// 存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    /// 文件不存在
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid json in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// 读取 JSON 文件
/// 兼容 Windows 编辑器写入的 UTF-8 BOM
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            StorageError::NotFound(path.to_path_buf())
        } else {
            StorageError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    let raw = raw.strip_prefix(UTF8_BOM).unwrap_or(&raw);

    serde_json::from_slice(raw).map_err(|e| StorageError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}

/// 写入 JSON 文件（格式化输出，自动创建父目录）
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let io_err = |e: io::Error| StorageError::Io {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let content = serde_json::to_string_pretty(value).map_err(|e| StorageError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    fs::write(path, content).map_err(io_err)?;
    Ok(())
}

// ======================== 读写接口 ========================

/// 主机登记表读取接口
pub trait HostRegistry: Send + Sync {
    fn load(&self) -> Result<Vec<DiscoveryHost>>;
}

/// 方案图存储接口
pub trait SchemeStore: Send + Sync {
    fn load(&self) -> Result<Scheme>;
    fn save(&self, scheme: &Scheme) -> Result<()>;
}

/// 菜单树读取接口
pub trait TreeReader: Send + Sync {
    fn load(&self) -> Result<TreeData>;
}

// ======================== 主机登记表 ========================

/// 基于 JSON 文件的主机登记表
/// 每次调用都重新读取文件，不做缓存
pub struct DiscoveryHostsRepository {
    path: PathBuf,
}

impl DiscoveryHostsRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HostRegistry for DiscoveryHostsRepository {
    fn load(&self) -> Result<Vec<DiscoveryHost>> {
        let hosts: Vec<DiscoveryHost> = read_json(&self.path)?;
        debug!("[Storage] Loaded {} discovery hosts", hosts.len());
        Ok(hosts)
    }
}

// ======================== 方案图 ========================

pub struct SchemeRepository {
    path: PathBuf,
}

impl SchemeRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SchemeStore for SchemeRepository {
    fn load(&self) -> Result<Scheme> {
        let raw: Map<String, Value> = read_json(&self.path)?;
        Ok(Scheme::normalize(&raw))
    }

    fn save(&self, scheme: &Scheme) -> Result<()> {
        write_json(&self.path, scheme)
    }
}

// ======================== 菜单树 ========================

pub struct TreeRepository {
    path: PathBuf,
}

impl TreeRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TreeReader for TreeRepository {
    fn load(&self) -> Result<TreeData> {
        read_json(&self.path)
    }
}

// ======================== Known Hosts ========================

/// known_hosts 持久化
/// 读改写在同一把锁内完成，避免并发发现时互相覆盖
pub struct KnownHostsStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl KnownHostsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 加载全部条目，文件不存在时返回空配置
    pub fn load(&self) -> Result<KnownHostsConfig> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.load_unlocked()
    }

    fn load_unlocked(&self) -> Result<KnownHostsConfig> {
        match read_json(&self.path) {
            Ok(config) => Ok(config),
            Err(e) if e.is_not_found() => Ok(KnownHostsConfig::default()),
            Err(e) => Err(e),
        }
    }

    /// 在锁内读取、修改，内容有变化时才写回
    pub fn update<R>(&self, f: impl FnOnce(&mut KnownHostsConfig) -> R) -> Result<R> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut config = self.load_unlocked()?;
        let before = config.clone();
        let result = f(&mut config);
        if config != before {
            write_json(&self.path, &config)?;
        }
        Ok(result)
    }

    /// 新增或刷新一条记录
    pub fn upsert(&self, entry: KnownHost) -> Result<()> {
        self.update(|config| match config.find_mut(&entry.host) {
            Some(existing) => *existing = entry,
            None => config.hosts.push(entry),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_json_tolerates_bom() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hosts.json");
        let mut raw = UTF8_BOM.to_vec();
        raw.extend_from_slice(br#"[{"id": 1, "ip": "10.0.0.1", "login": "root"}]"#);
        fs::write(&path, raw).unwrap();

        let hosts = DiscoveryHostsRepository::new(&path).load().unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].login, "root");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = SchemeRepository::new(dir.path().join("absent.json"))
            .load()
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tree.json");
        fs::write(&path, "{ not json").unwrap();
        let err = TreeRepository::new(&path).load().unwrap_err();
        assert!(matches!(err, StorageError::Json { .. }));
    }

    #[test]
    fn test_scheme_save_creates_parent_dirs_and_normalizes_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/tools/current_scheme.json");
        let repo = SchemeRepository::new(&path);

        let scheme = Scheme {
            next_entity_id: 4,
            ..Scheme::default()
        };
        repo.save(&scheme).unwrap();
        assert_eq!(repo.load().unwrap(), scheme);
    }

    #[test]
    fn test_known_hosts_upsert_replaces_existing_entry() {
        let dir = TempDir::new().unwrap();
        let store = KnownHostsStore::new(dir.path().join("known_hosts.json"));
        assert!(store.load().unwrap().hosts.is_empty());

        let mut entry = KnownHost {
            host: "10.0.0.1:22".to_string(),
            key_type: "ssh-ed25519".to_string(),
            fingerprint: "SHA256:aaa".to_string(),
            first_seen: "2026-01-01 00:00".to_string(),
            last_used: "2026-01-01 00:00".to_string(),
        };
        store.upsert(entry.clone()).unwrap();
        entry.last_used = "2026-02-01 00:00".to_string();
        store.upsert(entry.clone()).unwrap();

        let config = store.load().unwrap();
        assert_eq!(config.hosts, vec![entry]);
    }

    #[test]
    fn test_known_hosts_unchanged_update_skips_write() {
        let dir = TempDir::new().unwrap();
        let store = KnownHostsStore::new(dir.path().join("known_hosts.json"));

        let found = store.update(|config| config.find("10.0.0.1:22").is_some()).unwrap();
        assert!(!found);
        assert!(!store.path().exists());
    }
}
