//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（voxclone.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, BackendKind};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Failed to write configuration: {0}")]
    WriteError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["voxclone", "voxclone.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `VOXCLONE_`，层级分隔符 `__`）
/// 2. 配置文件（voxclone.toml 或 voxclone.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `VOXCLONE_MODEL__URL=http://gpu-box:8000`
/// - `VOXCLONE_MODEL__DEVICE=cpu`
/// - `VOXCLONE_GENERATION__MAX_CHUNK_LENGTH=150`
/// - `VOXCLONE_STORAGE__PROFILES_DIR=/data/profiles`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("model.backend", "http")?
        .set_default("model.url", "http://localhost:8000")?
        .set_default("model.timeout_secs", 300)?
        .set_default("model.device", "auto")?
        .set_default("generation.max_reference_samples", 3)?
        .set_default("audio.ffmpeg_path", "ffmpeg")?
        .set_default("storage.profiles_dir", "data/profiles")?
        .set_default("storage.samples_dir", "data/samples")?
        .set_default("storage.output_dir", "output")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: VOXCLONE_MODEL__URL=http://gpu-box:8000
    builder = builder.add_source(
        Environment::with_prefix("VOXCLONE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.model.backend == BackendKind::Http && config.model.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Model backend URL cannot be empty".to_string(),
        ));
    }

    if config.model.name.is_empty() {
        return Err(ConfigError::ValidationError(
            "Model name cannot be empty".to_string(),
        ));
    }

    if config.generation.max_chunk_length == 0 {
        return Err(ConfigError::ValidationError(
            "max_chunk_length must be greater than 0".to_string(),
        ));
    }

    if config.generation.max_reference_samples == 0 {
        return Err(ConfigError::ValidationError(
            "max_reference_samples must be greater than 0".to_string(),
        ));
    }

    if config.generation.output_sample_rate == 0 || config.audio.target_sample_rate == 0 {
        return Err(ConfigError::ValidationError(
            "Sample rates must be greater than 0".to_string(),
        ));
    }

    if !matches!(config.audio.target_bit_depth, 16 | 24 | 32) {
        return Err(ConfigError::ValidationError(format!(
            "Unsupported target bit depth: {}",
            config.audio.target_bit_depth
        )));
    }

    if config.audio.min_duration_secs >= config.audio.max_duration_secs {
        return Err(ConfigError::ValidationError(
            "min_duration_secs must be less than max_duration_secs".to_string(),
        ));
    }

    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 将默认配置写为 TOML 文件
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Err(ConfigError::WriteError(format!(
            "{} already exists",
            path.display()
        )));
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| ConfigError::WriteError(e.to_string()))?;
    std::fs::write(path, content).map_err(|e| ConfigError::WriteError(e.to_string()))?;

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Backend: {:?} ({})", config.model.backend, config.model.url);
    tracing::info!("Model: {}", config.model.name);
    tracing::info!("Model Cache: {:?}", config.model.cache_dir);
    tracing::info!(
        "Device: {:?}, Precision: {:?}",
        config.model.device,
        config.model.precision
    );
    tracing::info!("Max Chunk Length: {}", config.generation.max_chunk_length);
    tracing::info!("Output Sample Rate: {}", config.generation.output_sample_rate);
    tracing::info!("Profiles Directory: {:?}", config.storage.profiles_dir);
    tracing::info!("Output Directory: {:?}", config.storage.output_dir);
    tracing::info!("ffmpeg: {}", config.audio.ffmpeg_path);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_validation_passes_for_default_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_chunk_length() {
        let mut config = AppConfig::default();
        config.generation.max_chunk_length = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_url() {
        let mut config = AppConfig::default();
        config.model.url = String::new();
        assert!(validate_config(&config).is_err());

        config.model.backend = BackendKind::Fake;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_duration_bounds() {
        let mut config = AppConfig::default();
        config.audio.min_duration_secs = 40.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_explicit_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[model]\nbackend = \"fake\"\n\n[generation]\nmax_chunk_length = 80\n",
        )
        .unwrap();

        let config = load_config_from_path(Some(&path)).unwrap();
        assert_eq!(config.model.backend, BackendKind::Fake);
        assert_eq!(config.generation.max_chunk_length, 80);
        assert_eq!(config.generation.max_reference_samples, 3);
    }

    #[test]
    fn test_write_default_config_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("voxclone.toml");

        write_default_config(&path).unwrap();
        assert!(write_default_config(&path).is_err());

        let config = load_config_from_path(Some(&path)).unwrap();
        assert_eq!(config.server.port, 7860);
    }
}
