//! Voice Generator - 单次语音生成
//!
//! 流程: 前置检查 → 文本分块 → 逐块调用模型 → 拼接 → 写 WAV
//!
//! 任意一块失败则整体失败，不写出任何文件。同一时刻只允许一个生成调用
//! 使用模型句柄。

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::application::ports::{AudioStoragePort, CloneRequest, TtsError};
use crate::application::services::ModelManager;
use crate::config::GenerationConfig;
use crate::domain::voice::VoiceProfile;
use crate::domain::{chunk_text, concatenate, AudioBuffer, GenerationMode};

/// 生成错误
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Unsupported generation mode: {0}")]
    UnsupportedMode(GenerationMode),

    #[error("Text is empty")]
    EmptyText,

    #[error("Profile '{0}' has no reference samples")]
    NoSamples(String),

    #[error("No model loaded")]
    ModelNotLoaded,

    #[error("Chunk {index} of {total} failed: {source}")]
    ChunkFailed {
        index: usize,
        total: usize,
        #[source]
        source: TtsError,
    },

    #[error("Chunk {index} returned {actual} Hz, expected {expected} Hz")]
    SampleRateMismatch {
        index: usize,
        expected: u32,
        actual: u32,
    },

    #[error("Failed to write audio: {0}")]
    WriteFailed(String),
}

/// 生成配置
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub max_chunk_length: usize,
    pub max_reference_samples: usize,
    pub output_sample_rate: u32,
}

impl From<&GenerationConfig> for GeneratorConfig {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            max_chunk_length: config.max_chunk_length,
            max_reference_samples: config.max_reference_samples,
            output_sample_rate: config.output_sample_rate,
        }
    }
}

/// 生成结果
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub output_path: PathBuf,
    pub chunk_count: usize,
    pub sample_count: usize,
    pub duration_secs: f64,
}

/// Voice Generator
pub struct VoiceGenerator {
    config: GeneratorConfig,
    model_manager: Arc<ModelManager>,
    storage: Arc<dyn AudioStoragePort>,
    generation_lock: Mutex<()>,
}

impl VoiceGenerator {
    pub fn new(
        config: GeneratorConfig,
        model_manager: Arc<ModelManager>,
        storage: Arc<dyn AudioStoragePort>,
    ) -> Self {
        Self {
            config,
            model_manager,
            storage,
            generation_lock: Mutex::new(()),
        }
    }

    /// 生成语音，返回是否成功
    ///
    /// 失败原因只记录日志，不向调用方传播
    pub async fn generate(&self, text: &str, profile: &VoiceProfile, output_path: &Path) -> bool {
        match self
            .try_generate(GenerationMode::Clone, text, profile, output_path)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(
                    profile = %profile.id(),
                    output = %output_path.display(),
                    error = %e,
                    "Generation failed"
                );
                false
            }
        }
    }

    /// 生成语音，返回详细结果或失败原因
    pub async fn try_generate(
        &self,
        mode: GenerationMode,
        text: &str,
        profile: &VoiceProfile,
        output_path: &Path,
    ) -> Result<GenerationOutcome, GenerationError> {
        if !mode.is_supported() {
            return Err(GenerationError::UnsupportedMode(mode));
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::EmptyText);
        }

        if profile.samples().is_empty() {
            return Err(GenerationError::NoSamples(profile.id().to_string()));
        }

        let _guard = self.generation_lock.lock().await;

        let model = self
            .model_manager
            .get_model()
            .await
            .ok_or(GenerationError::ModelNotLoaded)?;

        let chunks = chunk_text(text, self.config.max_chunk_length);
        let total = chunks.len();
        let ref_audio: Vec<PathBuf> = profile
            .reference_paths(self.config.max_reference_samples)
            .into_iter()
            .map(Path::to_path_buf)
            .collect();

        tracing::info!(
            profile = %profile.id(),
            chunks = total,
            references = ref_audio.len(),
            text_len = text.chars().count(),
            "Starting generation"
        );

        let mut outputs: Vec<Vec<f32>> = Vec::with_capacity(total);
        for (index, chunk) in chunks.into_iter().enumerate() {
            tracing::debug!(index, total, chunk_len = chunk.chars().count(), "Generating chunk");

            let request = CloneRequest {
                text: chunk,
                ref_audio: ref_audio.clone(),
                ref_text: profile.reference_text().map(str::to_string),
                language: profile.language().to_string(),
            };

            let buffer = model
                .generate_voice_clone(request)
                .await
                .map_err(|source| GenerationError::ChunkFailed {
                    index,
                    total,
                    source,
                })?;

            // 不做重采样，采样率必须与输出一致
            if buffer.sample_rate != self.config.output_sample_rate {
                return Err(GenerationError::SampleRateMismatch {
                    index,
                    expected: self.config.output_sample_rate,
                    actual: buffer.sample_rate,
                });
            }

            outputs.push(buffer.samples);
        }

        let audio = AudioBuffer::new(concatenate(outputs), self.config.output_sample_rate);

        let bytes = self
            .storage
            .write_wav(output_path, &audio)
            .await
            .map_err(|e| GenerationError::WriteFailed(e.to_string()))?;

        tracing::info!(
            output = %output_path.display(),
            duration_secs = audio.duration_secs(),
            bytes,
            "Generation completed"
        );

        Ok(GenerationOutcome {
            output_path: output_path.to_path_buf(),
            chunk_count: total,
            sample_count: audio.len(),
            duration_secs: audio.duration_secs(),
        })
    }
}
