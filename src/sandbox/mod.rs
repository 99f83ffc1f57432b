//! 渲染沙箱：源码规范化、能力作用域、沙箱抽象与适配器
//!
//! 沙箱是外部能力：只约定「静默成功」或「上报一次错误」，不关心内部如何执行代码。

pub mod adapter;
pub mod command;
pub mod scope;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::oneshot;

pub use adapter::RenderAdapter;
pub use command::CommandSandbox;
pub use scope::{Capability, CapabilityScope};

/// 单次渲染尝试的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered,
    RenderFailed(String),
}

/// 规范化合成服务返回的源码：去掉第一个字面反斜杠，再去掉首尾空白。
///
/// 反斜杠是合成服务输出格式带来的转义残留，只针对这个服务，不是通用的清洗规则。
pub fn normalize_source(raw: &str) -> String {
    raw.replacen('\\', "", 1).trim().to_string()
}

/// 沙箱的错误上报端，最多上报一次（report 消耗 self）
#[derive(Debug)]
pub struct ErrorReporter {
    tx: oneshot::Sender<String>,
}

impl ErrorReporter {
    pub fn channel() -> (Self, oneshot::Receiver<String>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// 上报渲染错误；接收端已放弃（周期被取消）时返回 false
    pub fn report(self, message: impl Into<String>) -> bool {
        self.tx.send(message.into()).is_ok()
    }
}

/// 渲染沙箱 trait：推模型，只上报错误，从不显式上报成功
#[async_trait]
pub trait RenderSandbox: Send + Sync {
    /// 挂载代码。求值期间的错误应在返回前上报；若渲染之后仍可能异步出错，
    /// 可把 reporter 移交给后台任务，适配器会在沉降窗口内继续等待。
    async fn mount(&self, code: String, scope: Arc<CapabilityScope>, reporter: ErrorReporter);

    fn name(&self) -> &'static str {
        "sandbox"
    }
}

/// 从不报错的沙箱（未配置外部求值程序时使用）
#[derive(Debug, Default)]
pub struct NullSandbox;

#[async_trait]
impl RenderSandbox for NullSandbox {
    async fn mount(&self, code: String, _scope: Arc<CapabilityScope>, _reporter: ErrorReporter) {
        tracing::debug!(len = code.len(), "NullSandbox accepted source");
    }

    fn name(&self) -> &'static str {
        "null"
    }
}
