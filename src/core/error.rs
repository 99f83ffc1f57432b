//! 生成周期错误类型
//!
//! 三类错误的处理策略完全不同：Network 立即终止本周期，Render 由编排器自动重试，
//! InvalidFingerprint 只让编排器停在 Idle，不向用户展示。

use serde::Serialize;
use thiserror::Error;

/// 生成与渲染过程中可能出现的错误
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum GenerationError {
    /// 传输失败或服务返回非 2xx
    #[error("Network error: {0}")]
    Network(String),

    /// 沙箱求值/渲染时抛出的错误
    #[error("Render error: {0}")]
    Render(String),

    /// 路由参数缺失或不是正整数
    #[error("Invalid fingerprint")]
    InvalidFingerprint,
}

impl GenerationError {
    /// 底层原始信息（不带分类前缀），用于直接展示给用户
    pub fn message(&self) -> &str {
        match self {
            GenerationError::Network(msg) | GenerationError::Render(msg) => msg,
            GenerationError::InvalidFingerprint => "invalid fingerprint",
        }
    }

    /// 是否允许编排器静默重试；只有渲染失败被视为可能是暂时的
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::Render(_))
    }
}
