//! Audio Inspector Adapter - 基于 symphonia 的音频信息读取

mod symphonia_inspector;

pub use symphonia_inspector::SymphoniaInspector;
