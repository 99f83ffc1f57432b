//! 重试状态机（纯逻辑，无 I/O）
//!
//! 只负责状态迁移与重试预算，返回 Effect 交给 Orchestrator 执行（发请求、渲染、定时器）。
//! 在当前状态下无意义的触发返回 None，由调用方忽略。

use serde::Serialize;

use crate::core::GenerationError;
use crate::sandbox::RenderOutcome;

/// 单个生成周期的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CycleState {
    #[default]
    Idle,
    Requesting,
    AwaitingRender,
    RetryScheduled,
    Succeeded,
    Failed,
}

impl CycleState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CycleState::Succeeded | CycleState::Failed)
    }
}

/// 状态迁移要求执行的副作用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// 发起一次全新的生成请求
    Generate,
    /// 把生成结果交给渲染适配器
    Render,
    /// 按固定间隔安排第 attempt 次自动重试
    ScheduleRetry { attempt: u32 },
    Complete,
    /// 周期以失败结束
    Abort(GenerationError),
}

#[derive(Debug, Clone)]
pub struct RetryMachine {
    state: CycleState,
    budget: u32,
    max_retries: u32,
    auto_retrying: bool,
}

impl RetryMachine {
    pub fn new(max_retries: u32) -> Self {
        Self {
            state: CycleState::Idle,
            budget: 0,
            max_retries,
            auto_retrying: false,
        }
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    /// 已消耗的自动重试次数
    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// RetryScheduled 以及由它触发的 Requesting 期间为 true
    pub fn is_auto_retrying(&self) -> bool {
        self.auto_retrying
    }

    /// 全新周期（首次加载或手动重新生成）：任何状态 → Requesting，预算清零
    pub fn start(&mut self) -> Effect {
        self.state = CycleState::Requesting;
        self.budget = 0;
        self.auto_retrying = false;
        Effect::Generate
    }

    /// fingerprint 变化 / 卸载：丢弃周期，回到 Idle
    pub fn reset(&mut self) {
        self.state = CycleState::Idle;
        self.budget = 0;
        self.auto_retrying = false;
    }

    pub fn generation_succeeded(&mut self) -> Option<Effect> {
        if self.state != CycleState::Requesting {
            return None;
        }
        self.state = CycleState::AwaitingRender;
        self.auto_retrying = false;
        Some(Effect::Render)
    }

    /// 网络失败不自动重试，预算保持不变
    pub fn generation_failed(&mut self, error: GenerationError) -> Option<Effect> {
        if self.state != CycleState::Requesting {
            return None;
        }
        Some(self.fail(error))
    }

    pub fn render_finished(&mut self, outcome: RenderOutcome) -> Option<Effect> {
        if self.state != CycleState::AwaitingRender {
            return None;
        }
        match outcome {
            RenderOutcome::Rendered => {
                self.state = CycleState::Succeeded;
                Some(Effect::Complete)
            }
            RenderOutcome::RenderFailed(message) => Some(self.fail(GenerationError::Render(message))),
        }
    }

    /// 可重试的错误在预算内安排重试；预算耗尽时清零并终止，其余错误直接终止
    fn fail(&mut self, error: GenerationError) -> Effect {
        if error.is_retryable() {
            if self.budget < self.max_retries {
                self.budget += 1;
                self.state = CycleState::RetryScheduled;
                self.auto_retrying = true;
                return Effect::ScheduleRetry {
                    attempt: self.budget,
                };
            }
            self.budget = 0;
        }
        self.state = CycleState::Failed;
        self.auto_retrying = false;
        Effect::Abort(error)
    }

    /// 重试定时器到期：重新请求生成（不是重新渲染同一份代码）
    pub fn retry_due(&mut self) -> Option<Effect> {
        if self.state != CycleState::RetryScheduled {
            return None;
        }
        self.state = CycleState::Requesting;
        Some(Effect::Generate)
    }
}

impl Default for RetryMachine {
    fn default() -> Self {
        Self::new(3)
    }
}
