// 可取消的执行上下文
// 取消令牌 + 可选截止时间，所有阻塞的网络步骤都通过 run() 执行

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

/// 被打断的原因
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interrupted {
    Cancelled,
    /// 超过截止时间，附带本次的时间预算
    DeadlineExceeded(Duration),
}

#[derive(Clone, Debug, Default)]
pub struct DiscoveryContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
    budget: Option<Duration>,
}

impl DiscoveryContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 派生带超时的子上下文，截止时间取两者中较早的一个
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let (deadline, budget) = match (self.deadline, self.budget) {
            (Some(existing), Some(budget)) if existing <= candidate => (existing, budget),
            _ => (candidate, timeout),
        };

        Self {
            cancel: self.cancel.child_token(),
            deadline: Some(deadline),
            budget: Some(budget),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// 在 guard 被 drop 时取消（例如 HTTP 请求被客户端放弃）
    pub fn drop_guard(&self) -> DropGuard {
        self.cancel.clone().drop_guard()
    }

    /// 运行 future，取消或超时时立即返回并 drop 该 future
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Interrupted> {
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Interrupted::Cancelled),
            _ = deadline => Err(Interrupted::DeadlineExceeded(self.budget.unwrap_or_default())),
            output = fut => Ok(output),
        }
    }
}
