//! Voice Context - Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("无效的档案名称: {0}")]
    InvalidName(String),

    #[error("无效的档案标识: {0}")]
    InvalidId(String),

    #[error("无效的参考音频: {0}")]
    InvalidSample(String),

    #[error("档案至少需要一个参考音频")]
    NoSamples,
}
