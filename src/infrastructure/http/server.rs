//! HTTP Server
//!
//! Axum HTTP 服务器启动和配置

use std::sync::Arc;

use axum::middleware;
use axum::Router;
use http::header::CONTENT_TYPE;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::middleware::error_logging_middleware;
use super::routes::create_routes;
use super::state::AppState;
use crate::config::ServerConfig;

/// 构建带中间件的 Router
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    create_routes()
        .layer(middleware::from_fn(error_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// HTTP 服务器
pub struct HttpServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// 启动服务器，`shutdown_signal` 完成后优雅关闭
    pub async fn run_with_shutdown<F>(self, shutdown_signal: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = build_router(self.state.clone());
        let addr = self.config.addr();

        let listener = TcpListener::bind(&addr).await?;
        info!("Starting HTTP server on {}", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{
        DevicePreference, GeneratorConfig, ModelManager, ModelManagerConfig, Precision,
        ProfileRepositoryPort, VoiceGenerator,
    };
    use crate::domain::voice::{AudioSample, ProfileName, VoiceProfile};
    use crate::infrastructure::adapters::{FakeTtsBackend, WavFileStorage};
    use crate::infrastructure::persistence::JsonProfileRepository;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::path::PathBuf;
    use tempfile::{tempdir, TempDir};
    use tower::util::ServiceExt;

    async fn test_app() -> (Router, Arc<AppState>, TempDir) {
        let dir = tempdir().unwrap();
        let repo = Arc::new(JsonProfileRepository::new(dir.path().join("profiles")));
        let profile = VoiceProfile::new(
            ProfileName::new("Narrator").unwrap(),
            vec![AudioSample::new(PathBuf::from("ref.wav"), 4.0, 24000, 1, 16).unwrap()],
            "en",
            None,
        )
        .unwrap();
        repo.save(&profile).await.unwrap();

        let manager = Arc::new(
            ModelManager::new(
                ModelManagerConfig {
                    model_name: "fake".to_string(),
                    cache_dir: PathBuf::from("models"),
                    device: DevicePreference::Cpu,
                    precision: Precision::Float32,
                    force_fp32_on_mps: true,
                },
                Arc::new(FakeTtsBackend::with_defaults()),
            )
            .await,
        );
        let generator = Arc::new(VoiceGenerator::new(
            GeneratorConfig {
                max_chunk_length: 200,
                max_reference_samples: 3,
                output_sample_rate: 24000,
            },
            manager.clone(),
            Arc::new(WavFileStorage::new(16)),
        ));

        let state = Arc::new(AppState::new(
            repo,
            manager,
            generator,
            dir.path().join("samples"),
            dir.path().join("output"),
            false,
        ));
        (build_router(state.clone()), state, dir)
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    fn json(bytes: &[u8]) -> serde_json::Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ping_and_profiles() {
        let (app, _state, _dir) = test_app().await;

        let (status, body) = call(&app, "GET", "/api/ping", None).await;
        assert_eq!(status, StatusCode::OK);
        let body = json(&body);
        assert_eq!(body["errno"], 0);
        assert_eq!(body["data"]["model_loaded"], false);

        let (_, body) = call(&app, "GET", "/api/profile/list", None).await;
        let body = json(&body);
        assert_eq!(body["data"][0]["id"], "narrator");

        let (_, body) = call(
            &app,
            "POST",
            "/api/profile/get",
            Some(serde_json::json!({"id": "missing"})),
        )
        .await;
        assert_eq!(json(&body)["errno"], 404);
    }

    #[tokio::test]
    async fn test_generate_requires_loaded_model() {
        let (app, _state, _dir) = test_app().await;

        let (_, body) = call(
            &app,
            "POST",
            "/api/generate",
            Some(serde_json::json!({"profile_id": "narrator", "text": "Hello."})),
        )
        .await;
        assert_eq!(json(&body)["errno"], 503);

        let (_, body) = call(
            &app,
            "POST",
            "/api/generate",
            Some(serde_json::json!({"profile_id": "narrator", "text": "Hi", "mode": "design"})),
        )
        .await;
        assert_eq!(json(&body)["errno"], 400);
    }

    #[tokio::test]
    async fn test_generate_and_download() {
        let (app, state, _dir) = test_app().await;

        let (_, body) = call(&app, "POST", "/api/model/load", None).await;
        assert_eq!(json(&body)["data"]["loaded"], true);

        let (_, body) = call(
            &app,
            "POST",
            "/api/generate",
            Some(serde_json::json!({
                "profile_id": "narrator",
                "text": "Hello there.",
                "output_name": "greeting"
            })),
        )
        .await;
        let body = json(&body);
        assert_eq!(body["errno"], 0);
        assert_eq!(body["data"]["file"], "greeting.wav");
        assert!(state.output_dir.join("greeting.wav").exists());

        let (status, bytes) = call(&app, "GET", "/api/audio/greeting.wav", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&bytes[..4], b"RIFF");

        let (_, body) = call(&app, "GET", "/api/audio/missing.wav", None).await;
        assert_eq!(json(&body)["errno"], 404);
    }

    #[tokio::test]
    async fn test_batch_endpoint() {
        let (app, _state, _dir) = test_app().await;
        call(&app, "POST", "/api/model/load", None).await;

        let (_, body) = call(
            &app,
            "POST",
            "/api/batch",
            Some(serde_json::json!({
                "profile_id": "narrator",
                "script": "[INTRO]\nWelcome.\n[EMPTY]\n\n[OUTRO]\nGoodbye."
            })),
        )
        .await;
        let body = json(&body);
        assert_eq!(body["errno"], 0);
        assert_eq!(body["data"]["files"].as_array().unwrap().len(), 2);

        let (_, body) = call(
            &app,
            "POST",
            "/api/batch",
            Some(serde_json::json!({"profile_id": "narrator", "script": "no markers"})),
        )
        .await;
        assert_eq!(json(&body)["errno"], 400);
    }

    #[tokio::test]
    async fn test_model_unload() {
        let (app, state, _dir) = test_app().await;
        call(&app, "POST", "/api/model/load", None).await;
        let (_, body) = call(&app, "POST", "/api/model/unload", None).await;
        assert_eq!(json(&body)["data"]["loaded"], false);
        assert!(!state.model_manager.is_loaded().await);
    }
}
