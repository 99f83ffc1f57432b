//! 合成服务 HTTP 客户端
//!
//! `POST {base_url}{api_prefix}/generative/react`，JSON 请求体 `{ personaId, designerId }`。
//! 非 2xx、传输失败、响应体无法解析都归为 Network 错误；不做任何重试。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::core::{Fingerprint, GenerationError};
use crate::generation::{GenerateRequest, GenerateResponse, GenerationClient, GenerationResult};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_API_PREFIX: &str = "/api/v1";
const GENERATE_PATH: &str = "/generative/react";

pub struct HttpGenerationClient {
    client: Client,
    endpoint: String,
}

impl HttpGenerationClient {
    pub fn new(base_url: &str, api_prefix: &str, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: build_endpoint(base_url, api_prefix),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn build_endpoint(base_url: &str, api_prefix: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let prefix = api_prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{base}{GENERATE_PATH}")
    } else {
        format!("{base}/{prefix}{GENERATE_PATH}")
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn generate(&self, fingerprint: &Fingerprint) -> Result<GenerationResult, GenerationError> {
        tracing::debug!(endpoint = %self.endpoint, %fingerprint, "POST generation request");
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&GenerateRequest::from(fingerprint))
            .send()
            .await
            .map_err(|e| GenerationError::Network(format!("Request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GenerationError::Network(format!(
                "Failed to submit data (HTTP {})",
                status
            )));
        }

        let body: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| GenerationError::Network(format!("Invalid response body: {}", e)))?;
        Ok(body.into())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
