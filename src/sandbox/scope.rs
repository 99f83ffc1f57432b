//! 能力作用域：生成代码允许引用的预置符号
//!
//! 静态配置，不由编排器产生。默认与前端渲染环境一致：UI 组件库、图标集、少量状态 hook。

use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    UiPrimitives,
    IconSet,
    StateHook,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityScope {
    symbols: BTreeMap<String, Capability>,
}

impl CapabilityScope {
    pub fn empty() -> Self {
        Self {
            symbols: BTreeMap::new(),
        }
    }

    pub fn with(mut self, symbol: impl Into<String>, capability: Capability) -> Self {
        self.symbols.insert(symbol.into(), capability);
        self
    }

    pub fn get(&self, symbol: &str) -> Option<Capability> {
        self.symbols.get(symbol).copied()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl Default for CapabilityScope {
    fn default() -> Self {
        Self::empty()
            .with("MUI", Capability::UiPrimitives)
            .with("ICONS", Capability::IconSet)
            .with("useState", Capability::StateHook)
            .with("useEffect", Capability::StateHook)
            .with("useRef", Capability::StateHook)
    }
}
