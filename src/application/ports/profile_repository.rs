//! Profile Repository Port - 出站端口
//!
//! 声音档案持久化的抽象接口，具体实现在 infrastructure 层（JSON 文件）

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::voice::{ProfileId, VoiceProfile};

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Corrupt document: {0}")]
    CorruptDocument(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Profile Repository Port
#[async_trait]
pub trait ProfileRepositoryPort: Send + Sync {
    /// 保存档案（同 ID 覆盖）
    async fn save(&self, profile: &VoiceProfile) -> Result<(), RepositoryError>;

    /// 根据 ID 查找档案
    async fn find_by_id(&self, id: &ProfileId) -> Result<Option<VoiceProfile>, RepositoryError>;

    /// 获取所有档案（按名称排序）
    async fn find_all(&self) -> Result<Vec<VoiceProfile>, RepositoryError>;

    /// 删除档案
    async fn delete(&self, id: &ProfileId) -> Result<(), RepositoryError>;
}
