//! HTTP 生成客户端集成测试：本地 axum 服务模拟合成服务

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use genui::core::{
    spawn_orchestrator, CycleState, Fingerprint, GenerationError, OrchestratorSettings, RouteParams,
};
use genui::generation::{GenerationClient, HttpGenerationClient, DEFAULT_API_PREFIX};
use genui::sandbox::{CapabilityScope, NullSandbox, RenderAdapter};
use serde_json::{json, Value};

const ROUTE: &str = "/api/v1/generative/react";

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// 回显请求中的 id，模拟服务端 201 响应
async fn echo_component(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let persona = body["personaId"].as_u64().unwrap_or_default();
    let designer = body["designerId"].as_u64().unwrap_or_default();
    (
        StatusCode::CREATED,
        Json(json!({
            "userPrefferences": "minimal",
            "rawComponent": format!("\\<Box>{}/{}</Box>\n", persona, designer),
            "generatedPrompt": "generated prompt",
        })),
    )
}

fn counting_500(hits: Arc<AtomicUsize>) -> Router {
    Router::new().route(
        ROUTE,
        post(move || {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }),
    )
}

#[tokio::test]
async fn test_generate_posts_ids_and_maps_response() {
    let base = serve(Router::new().route(ROUTE, post(echo_component))).await;
    let client = HttpGenerationClient::new(&base, DEFAULT_API_PREFIX, 5);

    let before = chrono::Utc::now();
    let result = client.generate(&Fingerprint::new(2, 3).unwrap()).await.unwrap();
    assert!(result.received_at >= before && result.received_at <= chrono::Utc::now());
    assert_eq!(result.source_text, "\\<Box>2/3</Box>\n");
    assert_eq!(result.normalized_source(), "<Box>2/3</Box>");
    assert_eq!(result.explanation, "generated prompt");
    assert_eq!(result.user_preferences, "minimal");
}

#[tokio::test]
async fn test_non_success_status_is_network_error() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = serve(counting_500(hits.clone())).await;
    let client = HttpGenerationClient::new(&base, DEFAULT_API_PREFIX, 5);

    let err = client.generate(&Fingerprint::new(1, 1).unwrap()).await.unwrap_err();
    match err {
        GenerationError::Network(msg) => assert!(msg.contains("500")),
        other => panic!("expected Network error, got {:?}", other),
    }
    // 客户端内部不重试
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_malformed_body_is_network_error() {
    let app = Router::new().route(ROUTE, post(|| async { "not json" }));
    let base = serve(app).await;
    let client = HttpGenerationClient::new(&base, DEFAULT_API_PREFIX, 5);

    let err = client.generate(&Fingerprint::new(1, 1).unwrap()).await.unwrap_err();
    assert!(matches!(err, GenerationError::Network(_)));
}

#[tokio::test]
async fn test_orchestrator_over_http_succeeds() {
    let base = serve(Router::new().route(ROUTE, post(echo_component))).await;
    let client = Arc::new(HttpGenerationClient::new(&base, DEFAULT_API_PREFIX, 5));
    let adapter = RenderAdapter::new(
        Arc::new(NullSandbox),
        CapabilityScope::default(),
        Duration::from_millis(50),
    );
    let handle = spawn_orchestrator(client, adapter, OrchestratorSettings::default());

    handle.navigate(RouteParams::from_path("/generated-ui/1/1"));
    let view = handle.wait_until(|v| v.phase.is_terminal()).await;
    assert_eq!(view.phase, CycleState::Succeeded);
    assert_eq!(view.source.as_deref(), Some("<Box>1/1</Box>"));
}

#[tokio::test]
async fn test_orchestrator_http_500_fails_without_retry() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = serve(counting_500(hits.clone())).await;
    let client = Arc::new(HttpGenerationClient::new(&base, DEFAULT_API_PREFIX, 5));
    let adapter = RenderAdapter::new(
        Arc::new(NullSandbox),
        CapabilityScope::default(),
        Duration::from_millis(50),
    );
    let settings = OrchestratorSettings {
        retry_delay: Duration::from_millis(50),
        ..OrchestratorSettings::default()
    };
    let handle = spawn_orchestrator(client, adapter, settings);

    handle.navigate(RouteParams::from_path("/generated-ui/1/1"));
    let view = handle.wait_until(|v| v.phase.is_terminal()).await;
    assert_eq!(view.phase, CycleState::Failed);
    assert!(matches!(view.error, Some(GenerationError::Network(_))));
    assert_eq!(view.retry_budget, 0);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(handle.view().phase, CycleState::Failed);
}
