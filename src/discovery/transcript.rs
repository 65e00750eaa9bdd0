// 单次发现的过程日志（transcript）
// 每次尝试一个文件，只追加；创建之后的写入失败不影响发现流程

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::constants::discovery::{LOG_FILE_PREFIX, LOG_FILE_TIME_FORMAT, LOG_LINE_TIME_FORMAT};

/// 时钟函数，测试时可替换
pub type Clock = fn() -> DateTime<Local>;

/// 同一秒内的文件名冲突上限
const MAX_NAME_ATTEMPTS: u32 = 1000;

pub struct TranscriptLog {
    path: PathBuf,
    file: File,
    clock: Clock,
}

impl TranscriptLog {
    /// 确保目录存在并创建新的日志文件
    /// 同一秒已有文件时追加序号：discover_<ts>_2.log
    pub fn create(dir: &Path, clock: Clock) -> io::Result<Self> {
        fs::create_dir_all(dir)?;

        let stamp = clock().format(LOG_FILE_TIME_FORMAT).to_string();
        for n in 1..=MAX_NAME_ATTEMPTS {
            let name = if n == 1 {
                format!("{}{}.log", LOG_FILE_PREFIX, stamp)
            } else {
                format!("{}{}_{}.log", LOG_FILE_PREFIX, stamp, n)
            };
            let path = dir.join(name);

            match OpenOptions::new().append(true).create_new(true).open(&path) {
                Ok(file) => {
                    debug!("[Discovery] Opened transcript {}", path.display());
                    return Ok(Self { path, file, clock });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("too many discovery logs for {}", stamp),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 写入一行，带时间前缀
    pub fn line(&mut self, message: impl AsRef<str>) {
        let entry = format!(
            "{} {}\n",
            (self.clock)().format(LOG_LINE_TIME_FORMAT),
            message.as_ref()
        );
        if let Err(e) = self.file.write_all(entry.as_bytes()) {
            warn!(
                "[Discovery] Failed to write transcript {}: {}",
                self.path.display(),
                e
            );
        }
    }

    /// 刷盘并关闭
    pub fn close(self) {
        if let Err(e) = self.file.sync_all() {
            warn!(
                "[Discovery] Failed to sync transcript {}: {}",
                self.path.display(),
                e
            );
        }
    }
}
