//! Audio Inspector Port - 音频信息读取抽象

use std::path::Path;
use thiserror::Error;

/// 读取错误
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// 音频信息
#[derive(Debug, Clone, PartialEq)]
pub struct AudioInfo {
    /// 时长（秒）
    pub duration_secs: f64,
    /// 采样率
    pub sample_rate: u32,
    /// 声道数
    pub channels: u16,
    /// 位深度（压缩格式可能未知）
    pub bit_depth: Option<u16>,
    /// 峰值（绝对值）
    pub peak: f32,
    /// 均方根电平
    pub rms: f32,
    /// 接近满幅的样本比例
    pub clipped_ratio: f32,
}

/// Audio Inspector Port
pub trait AudioInspectorPort: Send + Sync {
    /// 解码音频文件并统计电平
    fn inspect(&self, path: &Path) -> Result<AudioInfo, InspectError>;
}
