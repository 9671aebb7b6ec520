//! Fake TTS Backend - 不依赖外部服务的测试后端
//!
//! 按文本长度生成正弦音，用于冒烟测试和无 GPU 环境的演示

use async_trait::async_trait;
use std::f32::consts::TAU;
use std::sync::Arc;

use crate::application::ports::{
    CloneRequest, Device, DeviceCapabilities, LoadRequest, SpeechModel, TtsBackendPort, TtsError,
};
use crate::domain::AudioBuffer;

/// Fake TTS 配置
#[derive(Debug, Clone)]
pub struct FakeTtsConfig {
    /// 输出采样率
    pub sample_rate: u32,
    /// 每个字符对应的时长（毫秒）
    pub ms_per_char: u32,
    /// 模拟推理延迟（毫秒）
    pub latency_ms: u64,
}

impl Default for FakeTtsConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24000,
            ms_per_char: 60,
            latency_ms: 0,
        }
    }
}

/// Fake TTS Backend
pub struct FakeTtsBackend {
    config: FakeTtsConfig,
}

impl FakeTtsBackend {
    pub fn new(config: FakeTtsConfig) -> Self {
        tracing::info!(
            sample_rate = config.sample_rate,
            ms_per_char = config.ms_per_char,
            "FakeTtsBackend initialized"
        );
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeTtsConfig::default())
    }
}

#[async_trait]
impl TtsBackendPort for FakeTtsBackend {
    async fn probe_devices(&self) -> Result<DeviceCapabilities, TtsError> {
        Ok(DeviceCapabilities::default())
    }

    async fn from_pretrained(&self, request: LoadRequest) -> Result<Arc<dyn SpeechModel>, TtsError> {
        tracing::debug!(model = %request.model_name, device = %request.device, "FakeTtsBackend: load");
        Ok(Arc::new(ToneModel {
            name: request.model_name,
            config: self.config.clone(),
        }))
    }

    async fn release(&self, model_name: &str, device: Device) -> Result<(), TtsError> {
        tracing::debug!(model = %model_name, device = %device, "FakeTtsBackend: release");
        Ok(())
    }
}

/// 生成正弦音的假模型
struct ToneModel {
    name: String,
    config: FakeTtsConfig,
}

impl ToneModel {
    fn render(&self, text: &str, reference_count: usize) -> Vec<f32> {
        let rate = self.config.sample_rate as f32;
        let len = text.chars().count() as u64 * self.config.ms_per_char as u64
            * self.config.sample_rate as u64
            / 1000;
        // 不同参考音频数量对应不同音高
        let freq = 180.0 + 20.0 * reference_count as f32;
        let fade = (rate * 0.01) as usize;
        let len = len as usize;

        (0..len)
            .map(|i| {
                let envelope = if i < fade {
                    i as f32 / fade as f32
                } else if i + fade > len {
                    (len - i) as f32 / fade as f32
                } else {
                    1.0
                };
                (TAU * freq * i as f32 / rate).sin() * 0.3 * envelope
            })
            .collect()
    }
}

#[async_trait]
impl SpeechModel for ToneModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_voice_clone(&self, request: CloneRequest) -> Result<AudioBuffer, TtsError> {
        let session_id = format!("fake-{}", uuid::Uuid::new_v4());
        tracing::debug!(
            session_id = %session_id,
            text_len = request.text.chars().count(),
            references = request.ref_audio.len(),
            "FakeTtsBackend: rendering tone"
        );

        if self.config.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;
        }

        Ok(AudioBuffer::new(
            self.render(&request.text, request.ref_audio.len()),
            self.config.sample_rate,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::Precision;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_tone_length_follows_text() {
        let backend = FakeTtsBackend::with_defaults();
        let model = backend
            .from_pretrained(LoadRequest {
                model_name: "fake".to_string(),
                cache_dir: PathBuf::from("models"),
                device: Device::Cpu,
                precision: Precision::Float32,
            })
            .await
            .unwrap();

        let audio = model
            .generate_voice_clone(CloneRequest {
                text: "Hello".to_string(),
                ref_audio: vec![PathBuf::from("a.wav")],
                ref_text: None,
                language: "en".to_string(),
            })
            .await
            .unwrap();

        // 5 字符 × 60ms × 24kHz
        assert_eq!(audio.len(), 7200);
        assert_eq!(audio.sample_rate, 24000);
        assert!(audio.samples.iter().all(|s| s.abs() <= 0.3));
        assert_eq!(model.name(), "fake");
    }
}
