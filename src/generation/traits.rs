//! 生成客户端抽象
//!
//! 所有后端（HTTP 合成服务 / Mock）实现 GenerationClient：每次调用只尝试一次，
//! 失败原样返回，重试策略全部由编排器负责。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Fingerprint, GenerationError};
use crate::sandbox::normalize_source;

/// 合成服务返回的一次生成结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    /// 原始组件源码（未经规范化）
    pub source_text: String,
    /// 生成理由 / 生成时使用的提示词
    pub explanation: String,
    /// 服务端回显的偏好描述
    pub user_preferences: String,
    pub received_at: DateTime<Utc>,
}

impl GenerationResult {
    pub fn new(source_text: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            explanation: explanation.into(),
            user_preferences: String::new(),
            received_at: Utc::now(),
        }
    }

    /// 交给沙箱、展示给用户的源码
    pub fn normalized_source(&self) -> String {
        normalize_source(&self.source_text)
    }
}

/// `POST /api/v1/generative/react` 请求体
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub persona_id: u32,
    pub designer_id: u32,
}

impl From<&Fingerprint> for GenerateRequest {
    fn from(fp: &Fingerprint) -> Self {
        Self {
            persona_id: fp.persona_id,
            designer_id: fp.designer_id,
        }
    }
}

/// 成功响应体；字段名沿用服务端拼写
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(rename = "userPrefferences", default)]
    pub user_preferences: String,
    #[serde(rename = "rawComponent", default)]
    pub raw_component: String,
    #[serde(rename = "generatedPrompt", default)]
    pub generated_prompt: String,
}

impl From<GenerateResponse> for GenerationResult {
    fn from(resp: GenerateResponse) -> Self {
        Self {
            source_text: resp.raw_component,
            explanation: resp.generated_prompt,
            user_preferences: resp.user_preferences,
            received_at: Utc::now(),
        }
    }
}

/// 生成客户端 trait：一次调用 = 一次网络尝试
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, fingerprint: &Fingerprint) -> Result<GenerationResult, GenerationError>;

    /// 日志用的后端名称
    fn name(&self) -> &'static str {
        "generation"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_is_camel_case() {
        let fp = Fingerprint::new(2, 3).unwrap();
        let body = serde_json::to_value(GenerateRequest::from(&fp)).unwrap();
        assert_eq!(body, serde_json::json!({ "personaId": 2, "designerId": 3 }));
    }

    #[test]
    fn test_response_maps_wire_names() {
        let resp: GenerateResponse = serde_json::from_str(
            r#"{"userPrefferences":"minimal","rawComponent":"\\<Box>Hi</Box>","generatedPrompt":"why"}"#,
        )
        .unwrap();
        let result = GenerationResult::from(resp);
        assert_eq!(result.source_text, "\\<Box>Hi</Box>");
        assert_eq!(result.normalized_source(), "<Box>Hi</Box>");
        assert_eq!(result.explanation, "why");
        assert_eq!(result.user_preferences, "minimal");
    }

    #[test]
    fn test_response_optional_fields_default() {
        let resp: GenerateResponse = serde_json::from_str(r#"{"userPrefferences":""}"#).unwrap();
        assert!(resp.raw_component.is_empty());
        assert!(resp.generated_prompt.is_empty());
    }
}
