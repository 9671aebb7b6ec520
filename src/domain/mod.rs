//! Domain Layer - 领域层
//!
//! - Voice Context: 声音档案
//! - 文本分块、脚本解析、音频拼接、校验结果等纯逻辑

pub mod voice;

mod audio;
mod generation;
mod script;
mod text_chunker;
mod validation;

pub use audio::{concatenate, AudioBuffer};
pub use generation::GenerationMode;
pub use script::{disambiguate_filenames, output_filename_for, parse_script, ScriptSegment};
pub use text_chunker::{chunk_text, DEFAULT_MAX_CHUNK_LENGTH};
pub use validation::ValidationResult;
