//! Application Services - 核心用例服务
//!
//! - ModelManager: 模型加载/卸载，设备与精度选择
//! - VoiceGenerator: 分块生成并写出 WAV
//! - BatchProcessor: 按脚本逐段生成
//! - SampleValidator / SamplePreparer: 参考音频校验与预处理

mod batch_processor;
mod model_manager;
mod sample_preparer;
mod sample_validator;
mod voice_generator;

#[cfg(test)]
pub(crate) mod test_support;

pub use batch_processor::{BatchProcessor, BatchReport, ProducedFile, SegmentFailure};
pub use model_manager::{
    resolve_precision, select_device, ModelManager, ModelManagerConfig, ModelStatus,
};
pub use sample_preparer::{PrepareOptions, SamplePreparer};
pub use sample_validator::{quality_score, SampleRequirements, SampleValidator};
pub use voice_generator::{GenerationError, GenerationOutcome, GeneratorConfig, VoiceGenerator};
