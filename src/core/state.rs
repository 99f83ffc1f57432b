//! 状态定义：OrchestratorView 投影与 Transition 事件
//!
//! 展示层只持有轻量的 OrchestratorView；完整的周期状态由 Orchestrator 维护并投影出来。

use serde::Serialize;

use crate::core::{CycleState, Fingerprint, GenerationError};
use crate::generation::GenerationResult;

/// 自动重试期间展示的中性提示（不展示底层错误）
pub const REGENERATING_NOTICE: &str = "We are regenerating your component...";

/// 周期编号：每次全新周期（首次加载 / 手动重新生成）递增
pub type CycleId = u64;

/// 展示层看到的「投影」状态
#[derive(Clone, Debug, Default, Serialize)]
pub struct OrchestratorView {
    pub phase: CycleState,
    pub cycle: CycleId,
    pub fingerprint: Option<Fingerprint>,
    pub persona_label: Option<&'static str>,
    pub style_label: Option<&'static str>,
    /// 仅在 Succeeded 时存在
    pub result: Option<GenerationResult>,
    /// 规范化后的源码（交给沙箱的那份），仅在 Succeeded 时存在
    pub source: Option<String>,
    /// 仅在 Failed 时存在
    pub error: Option<GenerationError>,
    pub error_message: Option<String>,
    pub notice: Option<&'static str>,
    pub is_auto_retrying: bool,
    pub retry_budget: u32,
    pub max_retries: u32,
}

impl OrchestratorView {
    /// 是否应展示手动「重新生成」入口
    pub fn can_regenerate(&self) -> bool {
        self.fingerprint.is_some()
    }
}

/// 状态迁移事件（广播给观察者）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub cycle: CycleId,
    pub from: CycleState,
    pub to: CycleState,
}
