//! TTS Engine Port - TTS 推理后端抽象
//!
//! 定义模型加载与声音克隆推理的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::AudioBuffer;

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Model load failed: {0}")]
    LoadFailed(String),

    #[error("Out of memory on {0}")]
    OutOfMemory(Device),
}

/// 计算设备
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// GPU 加速
    Cuda,
    /// Apple Silicon 加速
    Mps,
    /// 通用 CPU
    Cpu,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Cuda => "cuda",
            Device::Mps => "mps",
            Device::Cpu => "cpu",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 设备偏好（配置项）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    /// 自动检测: cuda > mps > cpu
    #[default]
    Auto,
    Cuda,
    Mps,
    Cpu,
}

/// 计算精度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Float32,
    Float16,
    #[default]
    Bfloat16,
}

impl Precision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Precision::Float32 => "float32",
            Precision::Float16 => "float16",
            Precision::Bfloat16 => "bfloat16",
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 后端报告的可用加速设备
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    #[serde(default)]
    pub cuda: bool,
    #[serde(default)]
    pub mps: bool,
}

/// 模型加载请求
#[derive(Debug, Clone)]
pub struct LoadRequest {
    /// 预训练模型名称
    pub model_name: String,
    /// 模型缓存目录
    pub cache_dir: PathBuf,
    pub device: Device,
    pub precision: Precision,
}

/// 声音克隆推理请求
#[derive(Debug, Clone)]
pub struct CloneRequest {
    /// 要合成的文本
    pub text: String,
    /// 参考音频路径
    pub ref_audio: Vec<PathBuf>,
    /// 参考音频对应的文本
    pub ref_text: Option<String>,
    /// 语言代码
    pub language: String,
}

/// 已加载的模型句柄
#[async_trait]
pub trait SpeechModel: Send + Sync {
    /// 模型名称
    fn name(&self) -> &str;

    /// 使用参考音频克隆声音合成文本
    async fn generate_voice_clone(&self, request: CloneRequest) -> Result<AudioBuffer, TtsError>;
}

/// TTS Backend Port
///
/// 负责检测设备、加载模型和回收设备内存
#[async_trait]
pub trait TtsBackendPort: Send + Sync {
    /// 查询可用加速设备
    async fn probe_devices(&self) -> Result<DeviceCapabilities, TtsError>;

    /// 加载预训练模型
    async fn from_pretrained(&self, request: LoadRequest) -> Result<Arc<dyn SpeechModel>, TtsError>;

    /// 释放模型并回收设备内存
    async fn release(&self, model_name: &str, device: Device) -> Result<(), TtsError>;

    /// 检查后端是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
