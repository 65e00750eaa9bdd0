// 发现阶段定义

/// 单次发现的阶段
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiscoveryStage {
    /// 初始化
    Init = 0,
    /// 日志已打开
    LogOpened = 1,
    /// 认证配置已构建
    ConfigBuilt = 2,
    /// 连接已建立并认证
    Connected = 3,
    /// 执行通道已打开
    SessionOpened = 4,
    /// 命令已执行
    Executed = 5,
    /// 成功
    Success = 6,
    /// 失败
    Failed = 7,
}

impl DiscoveryStage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::LogOpened => "log-opened",
            Self::ConfigBuilt => "config-built",
            Self::Connected => "connected",
            Self::SessionOpened => "session-opened",
            Self::Executed => "executed",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    /// 正常流程的下一阶段
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::LogOpened),
            Self::LogOpened => Some(Self::ConfigBuilt),
            Self::ConfigBuilt => Some(Self::Connected),
            Self::Connected => Some(Self::SessionOpened),
            Self::SessionOpened => Some(Self::Executed),
            Self::Executed => Some(Self::Success),
            Self::Success | Self::Failed => None,
        }
    }

    /// 是否允许从当前阶段迁移到 `to`
    pub fn can_transition(&self, to: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == Self::Failed || self.next() == Some(to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_reaches_success() {
        let mut stage = DiscoveryStage::Init;
        let mut steps = 0;
        while let Some(next) = stage.next() {
            assert!(stage.can_transition(next));
            stage = next;
            steps += 1;
        }
        assert_eq!(stage, DiscoveryStage::Success);
        assert_eq!(steps, 6);
    }

    #[test]
    fn test_any_live_stage_can_fail() {
        for stage in [
            DiscoveryStage::Init,
            DiscoveryStage::LogOpened,
            DiscoveryStage::ConfigBuilt,
            DiscoveryStage::Connected,
            DiscoveryStage::SessionOpened,
            DiscoveryStage::Executed,
        ] {
            assert!(stage.can_transition(DiscoveryStage::Failed));
        }
        assert!(!DiscoveryStage::Success.can_transition(DiscoveryStage::Failed));
        assert!(!DiscoveryStage::Init.can_transition(DiscoveryStage::Connected));
    }
}
