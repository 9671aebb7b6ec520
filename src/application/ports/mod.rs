//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_converter;
mod audio_inspector;
mod audio_storage;
mod profile_repository;
mod tts_engine;

pub use audio_converter::{AudioConverterPort, ConvertError, ConvertOptions};
pub use audio_inspector::{AudioInfo, AudioInspectorPort, InspectError};
pub use audio_storage::{AudioStorageError, AudioStoragePort};
pub use profile_repository::{ProfileRepositoryPort, RepositoryError};
pub use tts_engine::{
    CloneRequest, Device, DeviceCapabilities, DevicePreference, LoadRequest, Precision,
    SpeechModel, TtsBackendPort, TtsError,
};
