//! Mock 生成客户端（离线运行与测试用，无需后端）
//!
//! 按顺序消费预置的回复；队列为空时返回一个简单的示例组件。记录调用次数与请求的 fingerprint。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::{Fingerprint, GenerationError};
use crate::generation::{GenerationClient, GenerationResult};

/// 一条预置回复：可选延迟 + 结果
#[derive(Debug, Clone)]
pub struct MockReply {
    pub delay: Duration,
    pub result: Result<GenerationResult, GenerationError>,
}

impl MockReply {
    pub fn ok(source_text: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(GenerationResult::new(source_text, "mock explanation")),
        }
    }

    pub fn err(error: GenerationError) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(error),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Default)]
pub struct MockGenerationClient {
    replies: Mutex<VecDeque<MockReply>>,
    calls: AtomicUsize,
    requested: Mutex<Vec<Fingerprint>>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: impl IntoIterator<Item = MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<Fingerprint> {
        self.requested.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn sample(fingerprint: &Fingerprint) -> GenerationResult {
        GenerationResult::new(
            format!(
                "<MUI.Box sx={{{{ p: 2 }}}}><MUI.Typography>Generated for persona {} / style {}</MUI.Typography></MUI.Box>",
                fingerprint.persona_id, fingerprint.designer_id
            ),
            "Mock generation (no synthesis service configured)",
        )
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    async fn generate(&self, fingerprint: &Fingerprint) -> Result<GenerationResult, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut r) = self.requested.lock() {
            r.push(*fingerprint);
        }
        let next = self.replies.lock().ok().and_then(|mut q| q.pop_front());
        match next {
            Some(reply) => {
                if !reply.delay.is_zero() {
                    tokio::time::sleep(reply.delay).await;
                }
                reply.result
            }
            None => Ok(Self::sample(fingerprint)),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
