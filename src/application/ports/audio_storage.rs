//! Audio Storage Port - 出站端口
//!
//! 定义生成音频落盘的抽象接口

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

use crate::domain::AudioBuffer;

/// 音频存储错误
#[derive(Debug, Error)]
pub enum AudioStorageError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

/// Audio Storage Port - 出站端口
#[async_trait]
pub trait AudioStoragePort: Send + Sync {
    /// 将音频写为 WAV 文件
    ///
    /// 父目录不存在时自动创建；写入失败时目标路径不会留下半截文件。
    /// 返回写入的字节数。
    async fn write_wav(&self, path: &Path, audio: &AudioBuffer) -> Result<u64, AudioStorageError>;
}
