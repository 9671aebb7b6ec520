//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::{ConvertError, RepositoryError};
use crate::application::services::GenerationError;
use crate::domain::voice::ProfileError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 仓储错误
    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// 音频处理错误
    #[error("Audio processing error: {0}")]
    AudioError(String),

    /// 生成错误
    #[error("Generation error: {0}")]
    GenerationError(String),

    /// 外部服务错误
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => Self::not_found("Profile", id),
            other => Self::RepositoryError(other.to_string()),
        }
    }
}

impl From<ProfileError> for ApplicationError {
    fn from(err: ProfileError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<ConvertError> for ApplicationError {
    fn from(err: ConvertError) -> Self {
        match err {
            ConvertError::BinaryNotFound(_) => Self::ExternalServiceError(err.to_string()),
            other => Self::AudioError(other.to_string()),
        }
    }
}

impl From<GenerationError> for ApplicationError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::UnsupportedMode(_)
            | GenerationError::EmptyText
            | GenerationError::NoSamples(_) => Self::ValidationError(err.to_string()),
            GenerationError::ModelNotLoaded | GenerationError::ChunkFailed { .. } => {
                Self::ExternalServiceError(err.to_string())
            }
            GenerationError::SampleRateMismatch { .. } => Self::GenerationError(err.to_string()),
            GenerationError::WriteFailed(_) => Self::StorageError(err.to_string()),
        }
    }
}
