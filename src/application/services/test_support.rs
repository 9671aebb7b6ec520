//! 服务层测试用的脚本化后端

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::application::ports::{
    CloneRequest, Device, DeviceCapabilities, LoadRequest, SpeechModel, TtsBackendPort, TtsError,
};
use crate::domain::voice::{AudioSample, ProfileName, VoiceProfile};
use crate::domain::AudioBuffer;

pub const SAMPLE_RATE: u32 = 24000;

/// 每个字符生成的样本数
pub const SAMPLES_PER_CHAR: usize = 10;

/// 可控的假后端：记录调用次数，可让加载或包含指定文本的块失败
#[derive(Default)]
pub struct ScriptedBackend {
    pub capabilities: DeviceCapabilities,
    pub fail_load: bool,
    pub fail_marker: Option<String>,
    /// 模型输出采样率，默认 SAMPLE_RATE
    pub sample_rate: Option<u32>,
    pub probe_calls: AtomicUsize,
    pub load_calls: AtomicUsize,
    pub release_calls: AtomicUsize,
    pub requests: Arc<Mutex<Vec<CloneRequest>>>,
}

impl ScriptedBackend {
    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            ..Default::default()
        }
    }

    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self {
            sample_rate: Some(sample_rate),
            ..Default::default()
        }
    }

    pub fn recorded_requests(&self) -> Vec<CloneRequest> {
        self.requests.lock().unwrap().clone()
    }
}

struct ScriptedModel {
    fail_marker: Option<String>,
    sample_rate: u32,
    requests: Arc<Mutex<Vec<CloneRequest>>>,
}

#[async_trait]
impl SpeechModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate_voice_clone(&self, request: CloneRequest) -> Result<AudioBuffer, TtsError> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(marker) = &self.fail_marker {
            if request.text.contains(marker.as_str()) {
                return Err(TtsError::ServiceError(format!("scripted failure on {}", marker)));
            }
        }

        let len = request.text.chars().count() * SAMPLES_PER_CHAR;
        Ok(AudioBuffer::new(vec![0.25; len], self.sample_rate))
    }
}

#[async_trait]
impl TtsBackendPort for ScriptedBackend {
    async fn probe_devices(&self) -> Result<DeviceCapabilities, TtsError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.capabilities)
    }

    async fn from_pretrained(&self, _request: LoadRequest) -> Result<Arc<dyn SpeechModel>, TtsError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_load {
            return Err(TtsError::LoadFailed("scripted load failure".to_string()));
        }
        Ok(Arc::new(ScriptedModel {
            fail_marker: self.fail_marker.clone(),
            sample_rate: self.sample_rate.unwrap_or(SAMPLE_RATE),
            requests: self.requests.clone(),
        }))
    }

    async fn release(&self, _model_name: &str, _device: Device) -> Result<(), TtsError> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 含 `count` 个参考音频的档案
pub fn profile_with_samples(count: usize) -> VoiceProfile {
    let samples = (0..count)
        .map(|i| {
            AudioSample::new(PathBuf::from(format!("ref_{}.wav", i)), 4.0, SAMPLE_RATE, 1, 16)
                .unwrap()
        })
        .collect();
    VoiceProfile::new(
        ProfileName::new("Tester").unwrap(),
        samples,
        "en",
        Some("reference transcript".to_string()),
    )
    .unwrap()
}
