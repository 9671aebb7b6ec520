//! HTTP TTS Client - 调用外部 TTS 推理服务
//!
//! 实现 TtsBackendPort，模型在外部服务进程中加载和推理
//!
//! 外部 TTS API:
//! GET  /health
//! GET  /api/tts/devices  → {"cuda": bool, "mps": bool}
//! POST /api/tts/load     {"model", "cache_dir", "dtype", "device"}
//! POST /api/tts/clone    {"text", "ref_audio": [...], "ref_text", "language"} → audio/wav
//! POST /api/tts/unload   {"device", "empty_cache"}

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{
    CloneRequest, Device, DeviceCapabilities, LoadRequest, SpeechModel, TtsBackendPort, TtsError,
};
use crate::config::ModelConfig;
use crate::domain::AudioBuffer;

/// 加载请求体
#[derive(Debug, Serialize)]
struct LoadHttpRequest<'a> {
    model: &'a str,
    cache_dir: String,
    dtype: &'static str,
    device: &'static str,
}

/// 克隆推理请求体
#[derive(Debug, Serialize)]
struct CloneHttpRequest {
    text: String,
    /// 参考音频路径（服务端自行读取）
    ref_audio: Vec<String>,
    ref_text: Option<String>,
    language: String,
}

/// 卸载请求体
#[derive(Debug, Serialize)]
struct UnloadHttpRequest {
    device: &'static str,
    empty_cache: bool,
}

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// TTS 服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 300,
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl From<&ModelConfig> for HttpTtsClientConfig {
    fn from(config: &ModelConfig) -> Self {
        Self::new(config.url.clone()).with_timeout(config.timeout_secs)
    }
}

/// 共享的 HTTP 连接
struct Endpoint {
    client: Client,
    base_url: String,
}

impl Endpoint {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, TtsError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(map_request_error)?;
        Ok(response)
    }
}

fn map_request_error(e: reqwest::Error) -> TtsError {
    if e.is_timeout() {
        TtsError::Timeout
    } else if e.is_connect() {
        TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
    } else {
        TtsError::NetworkError(e.to_string())
    }
}

/// 非 2xx 响应转为错误；507 或提示内存不足的响应视为 OOM
async fn check_status(response: reqwest::Response, device: Device) -> Result<reqwest::Response, TtsError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::INSUFFICIENT_STORAGE || body.to_lowercase().contains("out of memory") {
        return Err(TtsError::OutOfMemory(device));
    }
    Err(TtsError::ServiceError(format!("HTTP {}: {}", status, body)))
}

/// 解码 WAV 字节为单声道 f32 样本（多声道取平均）
pub fn decode_wav_bytes(bytes: &[u8]) -> Result<AudioBuffer, TtsError> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| TtsError::InvalidResponse(format!("Invalid WAV: {}", e)))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| TtsError::InvalidResponse(e.to_string()))?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.saturating_sub(1) as u32)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| TtsError::InvalidResponse(e.to_string()))?
        }
    };

    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    Ok(AudioBuffer::new(samples, spec.sample_rate))
}

/// HTTP TTS 后端
pub struct HttpTtsBackend {
    endpoint: Arc<Endpoint>,
}

impl HttpTtsBackend {
    pub fn new(config: HttpTtsClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self {
            endpoint: Arc::new(Endpoint {
                client,
                base_url: config.base_url,
            }),
        })
    }
}

#[async_trait]
impl TtsBackendPort for HttpTtsBackend {
    async fn probe_devices(&self) -> Result<DeviceCapabilities, TtsError> {
        let response = self
            .endpoint
            .client
            .get(self.endpoint.url("/api/tts/devices"))
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(map_request_error)?;
        let response = check_status(response, Device::Cpu).await?;

        let capabilities: DeviceCapabilities = response
            .json()
            .await
            .map_err(|e| TtsError::InvalidResponse(e.to_string()))?;
        tracing::debug!(cuda = capabilities.cuda, mps = capabilities.mps, "Backend devices probed");
        Ok(capabilities)
    }

    async fn from_pretrained(&self, request: LoadRequest) -> Result<Arc<dyn SpeechModel>, TtsError> {
        let body = LoadHttpRequest {
            model: &request.model_name,
            cache_dir: request.cache_dir.to_string_lossy().into_owned(),
            dtype: request.precision.as_str(),
            device: request.device.as_str(),
        };

        tracing::debug!(
            url = %self.endpoint.url("/api/tts/load"),
            model = %request.model_name,
            device = %request.device,
            dtype = %request.precision,
            "Sending model load request"
        );

        let response = self.endpoint.post_json("/api/tts/load", &body).await?;
        check_status(response, request.device)
            .await
            .map_err(|e| match e {
                TtsError::ServiceError(message) => TtsError::LoadFailed(message),
                other => other,
            })?;

        Ok(Arc::new(HttpSpeechModel {
            endpoint: self.endpoint.clone(),
            name: request.model_name,
            device: request.device,
        }))
    }

    async fn release(&self, model_name: &str, device: Device) -> Result<(), TtsError> {
        let body = UnloadHttpRequest {
            device: device.as_str(),
            empty_cache: device == Device::Cuda,
        };
        let response = self.endpoint.post_json("/api/tts/unload", &body).await?;
        check_status(response, device).await?;
        tracing::debug!(model = %model_name, device = %device, "Backend released model");
        Ok(())
    }

    async fn health_check(&self) -> bool {
        match self
            .endpoint
            .client
            .get(self.endpoint.url("/health"))
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

/// 外部服务中已加载的模型
pub struct HttpSpeechModel {
    endpoint: Arc<Endpoint>,
    name: String,
    device: Device,
}

#[async_trait]
impl SpeechModel for HttpSpeechModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_voice_clone(&self, request: CloneRequest) -> Result<AudioBuffer, TtsError> {
        let body = CloneHttpRequest {
            ref_audio: request
                .ref_audio
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
            text: request.text,
            ref_text: request.ref_text,
            language: request.language,
        };

        tracing::debug!(
            text_len = body.text.chars().count(),
            references = body.ref_audio.len(),
            language = %body.language,
            "Sending TTS clone request"
        );

        let response = self.endpoint.post_json("/api/tts/clone", &body).await?;
        let response = check_status(response, self.device).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::InvalidResponse(format!("Failed to read audio: {}", e)))?;

        let audio = decode_wav_bytes(&bytes)?;
        tracing::debug!(
            samples = audio.len(),
            sample_rate = audio.sample_rate,
            audio_size = bytes.len(),
            "TTS clone completed"
        );
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::Precision;
    use axum::body::Bytes;
    use axum::http::{header, StatusCode as AxumStatus};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::path::PathBuf;

    fn wav_bytes(samples: &[i16], channels: u16) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let spec = hound::WavSpec {
                channels,
                sample_rate: 24000,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            };
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    async fn spawn_backend(oom: bool) -> String {
        let app = Router::new()
            .route("/health", get(|| async { "ok" }))
            .route(
                "/api/tts/devices",
                get(|| async { Json(serde_json::json!({"cuda": true, "mps": false})) }),
            )
            .route(
                "/api/tts/load",
                post(move |Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(body["dtype"], "float16");
                    if oom {
                        (AxumStatus::INTERNAL_SERVER_ERROR, "CUDA out of memory").into_response()
                    } else {
                        (AxumStatus::OK, "loaded").into_response()
                    }
                }),
            )
            .route(
                "/api/tts/clone",
                post(|Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(body["ref_audio"][0], "ref.wav");
                    let n = body["text"].as_str().unwrap_or_default().len();
                    let bytes = Bytes::from(wav_bytes(&vec![16384_i16; n], 1));
                    ([(header::CONTENT_TYPE, "audio/wav")], bytes)
                }),
            )
            .route("/api/tts/unload", post(|| async { "ok" }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn load_request() -> LoadRequest {
        LoadRequest {
            model_name: "m".to_string(),
            cache_dir: PathBuf::from("models"),
            device: Device::Cuda,
            precision: Precision::Float16,
        }
    }

    #[test]
    fn test_config_from_model_config() {
        let config = HttpTtsClientConfig::from(&ModelConfig::default());
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout_secs, 300);
    }

    #[test]
    fn test_decode_wav_bytes_downmixes() {
        let audio = decode_wav_bytes(&wav_bytes(&[16384, 0, -16384, 0], 2)).unwrap();
        assert_eq!(audio.sample_rate, 24000);
        assert_eq!(audio.samples, vec![0.25, -0.25]);

        assert!(matches!(
            decode_wav_bytes(b"not a wav"),
            Err(TtsError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_load_and_clone_roundtrip() {
        let url = spawn_backend(false).await;
        let backend = HttpTtsBackend::new(HttpTtsClientConfig::new(url)).unwrap();

        assert!(backend.health_check().await);
        let caps = backend.probe_devices().await.unwrap();
        assert!(caps.cuda);

        let model = backend.from_pretrained(load_request()).await.unwrap();
        let audio = model
            .generate_voice_clone(CloneRequest {
                text: "hello".to_string(),
                ref_audio: vec![PathBuf::from("ref.wav")],
                ref_text: None,
                language: "en".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(audio.len(), 5);
        assert_eq!(audio.samples[0], 0.5);

        backend.release("m", Device::Cuda).await.unwrap();
    }

    #[tokio::test]
    async fn test_load_out_of_memory() {
        let url = spawn_backend(true).await;
        let backend = HttpTtsBackend::new(HttpTtsClientConfig::new(url)).unwrap();

        let err = backend.from_pretrained(load_request()).await.err().unwrap();
        assert!(matches!(err, TtsError::OutOfMemory(Device::Cuda)));
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let backend =
            HttpTtsBackend::new(HttpTtsClientConfig::new("http://127.0.0.1:9").with_timeout(2))
                .unwrap();
        assert!(!backend.health_check().await);
        assert!(backend.probe_devices().await.is_err());
    }
}
