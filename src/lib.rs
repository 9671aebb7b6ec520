//! voxclone - 声音克隆工具
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Voice Context: 音色档案、参考样本
//! - 文本分块、脚本解析、音频缓冲
//!
//! 应用层 (application/):
//! - Ports: TtsBackend, AudioConverter, AudioInspector, AudioStorage, ProfileRepository
//! - Services: ModelManager, VoiceGenerator, BatchProcessor, SampleValidator, SamplePreparer
//! - Commands / Queries: 档案管理的 CQRS 处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API
//! - Persistence: JSON 档案存储
//! - Adapters: HTTP/Fake TTS 后端、ffmpeg、symphonia、WAV 写入

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
