//! 核心编排层：错误类型、fingerprint 解析、请求闸门、重试状态机、状态投影、主控循环

pub mod error;
pub mod fingerprint;
pub mod gate;
pub mod machine;
pub mod orchestrator;
pub mod state;

pub use error::GenerationError;
pub use fingerprint::{Fingerprint, RouteParams};
pub use gate::RequestGate;
pub use machine::{CycleState, Effect, RetryMachine};
pub use orchestrator::{
    create_orchestrator_with_config, spawn_orchestrator, Command, OrchestratorHandle,
    OrchestratorSettings,
};
pub use state::{CycleId, OrchestratorView, Transition, REGENERATING_NOTICE};
