//! GenUI - 生成式 UI 编排器
//!
//! 模块划分：
//! - **catalog**: 内置 persona / 设计风格目录
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: fingerprint 解析、请求闸门、重试状态机、状态投影、主控循环
//! - **generation**: 合成服务客户端抽象与实现（HTTP / Mock）
//! - **observability**: 日志初始化
//! - **sandbox**: 源码规范化、能力作用域、渲染沙箱与适配器

pub mod catalog;
pub mod config;
pub mod core;
pub mod generation;
pub mod observability;
pub mod sandbox;

pub use crate::core::{create_orchestrator_with_config, Command, CycleState, Fingerprint, OrchestratorHandle};
