//! 生成层：客户端抽象与实现（HTTP 合成服务 / Mock）

pub mod http;
pub mod mock;
pub mod traits;

use std::sync::Arc;

use crate::config::AppConfig;

pub use http::{HttpGenerationClient, DEFAULT_API_PREFIX, DEFAULT_BASE_URL};
pub use mock::{MockGenerationClient, MockReply};
pub use traits::{GenerateRequest, GenerateResponse, GenerationClient, GenerationResult};

/// 根据配置选择生成后端（HTTP / Mock）
pub fn create_client_from_config(cfg: &AppConfig) -> Arc<dyn GenerationClient> {
    match cfg.generation.provider.to_lowercase().as_str() {
        "mock" => {
            tracing::warn!("Using Mock generation client, no requests reach the synthesis service");
            Arc::new(MockGenerationClient::new())
        }
        "http" => {
            let client = HttpGenerationClient::new(
                &cfg.generation.base_url,
                &cfg.generation.api_prefix,
                cfg.generation.timeout_secs,
            );
            tracing::info!("Using synthesis service at {}", client.endpoint());
            Arc::new(client)
        }
        other => {
            tracing::warn!("Unknown generation provider '{}', falling back to http", other);
            Arc::new(HttpGenerationClient::new(
                &cfg.generation.base_url,
                &cfg.generation.api_prefix,
                cfg.generation.timeout_secs,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_selection() {
        let mut cfg = AppConfig::default();
        assert_eq!(create_client_from_config(&cfg).name(), "http");
        cfg.generation.provider = "MOCK".into();
        assert_eq!(create_client_from_config(&cfg).name(), "mock");
    }
}
