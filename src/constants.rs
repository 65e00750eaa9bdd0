// 全局常量

/// 发现流程相关默认值
pub mod discovery {
    use std::time::Duration;

    /// 默认 SSH 端口
    pub const DEFAULT_SSH_PORT: u16 = 22;
    /// 单次发现的默认连接超时
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    /// HTTP 请求级别的默认超时（包含连接与命令执行）
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
    /// 采集输出上限（4 MiB）
    pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 4 * 1024 * 1024;
    /// 发现请求体上限
    pub const DEFAULT_MAX_BODY_BYTES: usize = 4096;
    /// 唯一执行的远程命令
    pub const FACTS_COMMAND: &str = "cat /etc/os-release";
    /// 日志文件名前缀
    pub const LOG_FILE_PREFIX: &str = "discover_";
    /// 日志文件名时间格式（秒级）
    pub const LOG_FILE_TIME_FORMAT: &str = "%Y%m%d%H%M%S";
    /// 日志行时间前缀格式
    pub const LOG_LINE_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";
}

/// 环境变量
pub mod env {
    /// 覆盖 SSH 端口
    pub const SSH_PORT: &str = "INVHUB_SSH_PORT";
    /// 配置文件路径
    pub const CONFIG_PATH: &str = "INVHUB_CONFIG";
}

/// 方案编辑器请求体上限（1 MiB）
pub const DEFAULT_SCHEME_MAX_BODY_BYTES: usize = 1 << 20;
