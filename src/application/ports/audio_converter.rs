//! Audio Converter Port - 音频格式转换抽象
//!
//! 格式/采样率转换、淡入淡出、静音裁剪和响度归一化都交给外部工具完成，
//! 这里只定义接口

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// 转换错误
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Converter binary not found: {0}")]
    BinaryNotFound(String),

    #[error("Conversion failed ({status}): {stderr}")]
    Failed { status: String, stderr: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// 转换配置
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// 目标采样率，None 保持原始
    pub sample_rate: Option<u32>,
    /// 目标声道数，None 保持原始
    pub channels: Option<u16>,
    /// 目标位深（16/24/32），None 保持原始
    pub bit_depth: Option<u16>,
}

/// Audio Converter Port
#[async_trait]
pub trait AudioConverterPort: Send + Sync {
    /// 检查转换工具可用，返回版本信息
    async fn ensure_available(&self) -> Result<String, ConvertError>;

    /// 转换格式/采样率/声道/位深
    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        options: &ConvertOptions,
    ) -> Result<(), ConvertError>;

    /// 添加淡入淡出
    async fn apply_fades(
        &self,
        input: &Path,
        output: &Path,
        fade_ms: u32,
        duration_secs: f64,
    ) -> Result<(), ConvertError>;

    /// 裁剪首尾静音
    async fn trim_silence(&self, input: &Path, output: &Path) -> Result<(), ConvertError>;

    /// 响度归一化
    async fn normalize_loudness(
        &self,
        input: &Path,
        output: &Path,
        target_lufs: f32,
    ) -> Result<(), ConvertError>;
}
