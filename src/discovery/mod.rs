// 主机发现模块
//
// 模块结构:
// - collector: 事实采集器 (SshFactsCollector)
// - context: 取消与截止时间 (DiscoveryContext)
// - error: 错误分类 (DiscoveryError, CollectFailure)
// - stage: 单次发现的阶段
// - transcript: 每次发现一个的过程日志文件
// - mock: 模拟 SSH 端点，仅测试与 `mock` feature 可见

pub mod collector;
pub mod context;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod stage;
pub mod transcript;

pub use collector::{CollectedFacts, CollectorSettings, FactsCollector, SshAuth, SshFactsCollector};
pub use context::{DiscoveryContext, Interrupted};
pub use error::{CollectFailure, DiscoveryError};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockBehavior, MockConnector};
pub use stage::DiscoveryStage;
pub use transcript::TranscriptLog;
