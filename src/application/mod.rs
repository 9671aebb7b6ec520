//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（TTS 后端、音频转换/读取/存储、档案仓储）
//! - services: Model Manager、Voice Generator、Batch Processor、样本校验与预处理
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;
pub mod services;

// Re-exports
pub use commands::{
    handlers::{CreateProfileHandler, CreateProfileResponse, DeleteProfileHandler},
    CreateProfile, DeleteProfile,
};

pub use error::ApplicationError;

pub use ports::{
    AudioConverterPort, AudioInfo, AudioInspectorPort, AudioStoragePort, CloneRequest,
    ConvertError, Device, DevicePreference, Precision, ProfileRepositoryPort, RepositoryError,
    SpeechModel, TtsBackendPort, TtsError,
};

pub use queries::{
    handlers::{
        GetProfileHandler, ListProfilesHandler, ProfileResponse, ProfileSummary, SampleResponse,
    },
    GetProfile, ListProfiles,
};

pub use services::{
    BatchProcessor, BatchReport, GenerationError, GenerationOutcome, GeneratorConfig,
    ModelManager, ModelManagerConfig, ModelStatus, PrepareOptions, SamplePreparer,
    SampleRequirements, SampleValidator, VoiceGenerator,
};
