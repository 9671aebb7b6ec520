//! Configuration Types
//!
//! 定义所有配置结构体

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::ports::{DevicePreference, Precision};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 模型配置
    #[serde(default)]
    pub model: ModelConfig,

    /// 生成配置
    #[serde(default)]
    pub generation: GenerationConfig,

    /// 参考音频配置
    #[serde(default)]
    pub audio: AudioConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 批处理配置
    #[serde(default)]
    pub batch: BatchConfig,

    /// HTTP API 配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 推理后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// 外部 HTTP 推理服务
    #[default]
    Http,
    /// 本地正弦波假后端（冒烟测试用）
    Fake,
}

/// 模型配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    /// 推理后端
    #[serde(default)]
    pub backend: BackendKind,

    /// 推理服务基础 URL
    #[serde(default = "default_model_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,

    /// 预训练模型名称
    #[serde(default = "default_model_name")]
    pub name: String,

    /// 模型缓存目录
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// 计算设备（auto 表示自动检测）
    #[serde(default)]
    pub device: DevicePreference,

    /// 计算精度
    #[serde(default)]
    pub precision: Precision,

    /// 该模型在 MPS 上是否必须使用 float32
    #[serde(default = "default_force_fp32_on_mps")]
    pub force_fp32_on_mps: bool,
}

fn default_model_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_model_timeout() -> u64 {
    300
}

fn default_model_name() -> String {
    "Qwen/Qwen3-TTS-12Hz-1.7B-Base".to_string()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_force_fp32_on_mps() -> bool {
    true
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            url: default_model_url(),
            timeout_secs: default_model_timeout(),
            name: default_model_name(),
            cache_dir: default_cache_dir(),
            device: DevicePreference::default(),
            precision: Precision::default(),
            force_fp32_on_mps: default_force_fp32_on_mps(),
        }
    }
}

/// 生成配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// 单块最大字符数
    #[serde(default = "default_max_chunk_length")]
    pub max_chunk_length: usize,

    /// 每次调用送入模型的参考音频数量上限
    #[serde(default = "default_max_reference_samples")]
    pub max_reference_samples: usize,

    /// 输出采样率（模型原生采样率）
    #[serde(default = "default_output_sample_rate")]
    pub output_sample_rate: u32,
}

fn default_max_chunk_length() -> usize {
    crate::domain::DEFAULT_MAX_CHUNK_LENGTH
}

fn default_max_reference_samples() -> usize {
    3
}

fn default_output_sample_rate() -> u32 {
    24000
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_chunk_length: default_max_chunk_length(),
            max_reference_samples: default_max_reference_samples(),
            output_sample_rate: default_output_sample_rate(),
        }
    }
}

/// 参考音频配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AudioConfig {
    /// ffmpeg 可执行文件
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// 目标采样率（Hz）
    #[serde(default = "default_target_sample_rate")]
    pub target_sample_rate: u32,

    /// 目标声道数
    #[serde(default = "default_target_channels")]
    pub target_channels: u16,

    /// 目标位深
    #[serde(default = "default_target_bit_depth")]
    pub target_bit_depth: u16,

    /// 最短时长（秒）
    #[serde(default = "default_min_duration")]
    pub min_duration_secs: f64,

    /// 最长时长（秒）
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f64,

    /// 准备样本时裁剪首尾静音
    #[serde(default = "default_true")]
    pub trim_silence: bool,

    /// 准备样本时做响度归一化
    #[serde(default = "default_true")]
    pub normalize_loudness: bool,

    /// 响度目标（LUFS）
    #[serde(default = "default_loudness_target")]
    pub loudness_target_lufs: f32,

    /// 淡入淡出时长（毫秒），0 表示不处理
    #[serde(default = "default_fade_ms")]
    pub fade_ms: u32,
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_target_sample_rate() -> u32 {
    24000
}

fn default_target_channels() -> u16 {
    1
}

fn default_target_bit_depth() -> u16 {
    16
}

fn default_min_duration() -> f64 {
    3.0
}

fn default_max_duration() -> f64 {
    30.0
}

fn default_true() -> bool {
    true
}

fn default_loudness_target() -> f32 {
    -16.0
}

fn default_fade_ms() -> u32 {
    50
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            target_sample_rate: default_target_sample_rate(),
            target_channels: default_target_channels(),
            target_bit_depth: default_target_bit_depth(),
            min_duration_secs: default_min_duration(),
            max_duration_secs: default_max_duration(),
            trim_silence: true,
            normalize_loudness: true,
            loudness_target_lufs: default_loudness_target(),
            fade_ms: default_fade_ms(),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// 档案 JSON 目录
    #[serde(default = "default_profiles_dir")]
    pub profiles_dir: PathBuf,

    /// 预处理后参考音频目录
    #[serde(default = "default_samples_dir")]
    pub samples_dir: PathBuf,

    /// 生成音频输出目录
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_profiles_dir() -> PathBuf {
    PathBuf::from("data/profiles")
}

fn default_samples_dir() -> PathBuf {
    PathBuf::from("data/samples")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            profiles_dir: default_profiles_dir(),
            samples_dir: default_samples_dir(),
            output_dir: default_output_dir(),
        }
    }
}

/// 批处理配置
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BatchConfig {
    /// 重复标记的输出文件名追加 `_2`、`_3` 后缀
    #[serde(default)]
    pub unique_output_names: bool,
}

/// HTTP API 配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7860
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.model.url, "http://localhost:8000");
        assert_eq!(config.model.backend, BackendKind::Http);
        assert_eq!(config.generation.max_reference_samples, 3);
        assert_eq!(config.storage.profiles_dir, PathBuf::from("data/profiles"));
        assert!(!config.batch.unique_output_names);
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "127.0.0.1:7860");
    }

    #[test]
    fn test_partial_toml_uses_field_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [model]
            device = "cpu"
            precision = "float16"

            [generation]
            max_chunk_length = 120
            "#,
        )
        .unwrap();

        assert_eq!(config.model.device, DevicePreference::Cpu);
        assert_eq!(config.model.precision, Precision::Float16);
        assert_eq!(config.generation.max_chunk_length, 120);
        assert_eq!(config.generation.output_sample_rate, 24000);
        assert_eq!(config.audio.ffmpeg_path, "ffmpeg");
    }
}
