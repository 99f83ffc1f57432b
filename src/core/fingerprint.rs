//! Fingerprint 解析：路由参数 → (persona, designer) 请求键
//!
//! 路由形如 `/generated-ui/{designerId}/{personaId}`；任一段缺失或不是正整数时解析为
//! InvalidFingerprint，编排器保持 Idle、不发任何请求。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::GenerationError;

const ROUTE_PREFIX: &str = "/generated-ui";

/// 一次生成周期的请求键：目标人群 + 设计风格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    pub persona_id: u32,
    pub designer_id: u32,
}

impl Fingerprint {
    pub fn new(persona_id: u32, designer_id: u32) -> Option<Self> {
        if persona_id == 0 || designer_id == 0 {
            return None;
        }
        Some(Self {
            persona_id,
            designer_id,
        })
    }

    /// 从原始字符串参数解析；缺失、非数字、非正数都是 InvalidFingerprint
    pub fn resolve(persona: Option<&str>, designer: Option<&str>) -> Result<Self, GenerationError> {
        let persona_id = persona.and_then(parse_id);
        let designer_id = designer.and_then(parse_id);
        persona_id
            .zip(designer_id)
            .and_then(|(p, d)| Self::new(p, d))
            .ok_or(GenerationError::InvalidFingerprint)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "persona={} designer={}", self.persona_id, self.designer_id)
    }
}

fn parse_id(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok()
}

/// 路由上的原始参数（尚未校验）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    pub designer_id: Option<String>,
    pub persona_id: Option<String>,
}

impl RouteParams {
    pub fn new(designer_id: Option<&str>, persona_id: Option<&str>) -> Self {
        Self {
            designer_id: designer_id.map(String::from),
            persona_id: persona_id.map(String::from),
        }
    }

    /// 解析 `/generated-ui/{designerId}/{personaId}`；不匹配的路径返回空参数
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default().trim();
        let Some(rest) = path.strip_prefix(ROUTE_PREFIX) else {
            return Self::default();
        };
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        if rest.is_empty() {
            return Self::default();
        }
        let Some(rest) = rest.strip_prefix('/') else {
            return Self::default();
        };

        let mut segments = rest.split('/');
        let designer = segments.next();
        let persona = segments.next();
        if segments.next().is_some() {
            return Self::default();
        }
        let segment = |s: Option<&str>| s.filter(|s| !s.is_empty()).map(String::from);
        Self {
            designer_id: segment(designer),
            persona_id: segment(persona),
        }
    }

    pub fn resolve(&self) -> Result<Fingerprint, GenerationError> {
        Fingerprint::resolve(self.persona_id.as_deref(), self.designer_id.as_deref())
    }

    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.resolve().ok()
    }
}
