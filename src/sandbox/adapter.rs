//! 渲染适配器：规范化源码 → 挂载到沙箱 → 观察是否上报错误
//!
//! 成功没有显式信号：挂载返回后在沉降窗口内没有错误（或 reporter 已被丢弃）即视为 Rendered。
//! 适配器本身不校验代码，也不重试。

use std::sync::Arc;
use std::time::Duration;

use crate::sandbox::{normalize_source, CapabilityScope, ErrorReporter, RenderOutcome, RenderSandbox};

#[derive(Clone)]
pub struct RenderAdapter {
    sandbox: Arc<dyn RenderSandbox>,
    scope: Arc<CapabilityScope>,
    settle: Duration,
}

impl RenderAdapter {
    pub fn new(sandbox: Arc<dyn RenderSandbox>, scope: CapabilityScope, settle: Duration) -> Self {
        Self {
            sandbox,
            scope: Arc::new(scope),
            settle,
        }
    }

    pub fn sandbox_name(&self) -> &'static str {
        self.sandbox.name()
    }

    /// 渲染一次。future 被丢弃时挂载也随之取消。
    pub async fn present(&self, source_text: &str) -> RenderOutcome {
        let code = normalize_source(source_text);
        let (reporter, mut rx) = ErrorReporter::channel();

        let mount = self.sandbox.mount(code, self.scope.clone(), reporter);
        tokio::pin!(mount);

        tokio::select! {
            reported = &mut rx => return outcome(reported.ok()),
            () = &mut mount => {}
        }

        match tokio::time::timeout(self.settle, rx).await {
            Ok(reported) => outcome(reported.ok()),
            // 窗口内无错误
            Err(_) => RenderOutcome::Rendered,
        }
    }
}

fn outcome(reported: Option<String>) -> RenderOutcome {
    match reported {
        Some(message) => RenderOutcome::RenderFailed(message),
        None => RenderOutcome::Rendered,
    }
}
