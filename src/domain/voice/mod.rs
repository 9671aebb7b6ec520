//! Voice Context - 声音档案限界上下文
//!
//! 职责:
//! - 参考音频样本
//! - 声音档案元数据
//! - 档案不变量校验

mod aggregate;
mod errors;
mod value_objects;

pub use aggregate::{VoiceProfile, DEFAULT_LANGUAGE};
pub use errors::ProfileError;
pub use value_objects::{AudioFormat, AudioSample, ProfileId, ProfileName, DEFAULT_EMOTION};
