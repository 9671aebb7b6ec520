//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod converter;
pub mod inspector;
pub mod storage;
pub mod tts;

pub use converter::*;
pub use inspector::*;
pub use storage::*;
pub use tts::*;
