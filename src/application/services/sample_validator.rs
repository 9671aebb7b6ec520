//! Sample Validator - 参考音频校验
//!
//! 错误: 文件不存在、格式不支持、无法解码、时长越界、静音
//! 警告: 采样率/声道/位深与目标不同（可转换）、削波、电平过低

use serde_json::json;
use std::path::Path;
use std::sync::Arc;

use crate::application::ports::{AudioInfo, AudioInspectorPort};
use crate::config::AudioConfig;
use crate::domain::voice::AudioFormat;
use crate::domain::ValidationResult;

/// 低于此 RMS 视为静音（约 -60 dBFS）
const SILENCE_RMS: f32 = 0.001;
/// 峰值低于此值视为电平过低（约 -20 dBFS）
const LOW_PEAK: f32 = 0.1;
/// 满幅样本比例超过此值视为削波
const CLIPPING_RATIO: f32 = 0.001;

/// 参考音频要求
#[derive(Debug, Clone)]
pub struct SampleRequirements {
    pub min_duration_secs: f64,
    pub max_duration_secs: f64,
    pub target_sample_rate: u32,
    pub target_channels: u16,
    pub target_bit_depth: u16,
}

impl From<&AudioConfig> for SampleRequirements {
    fn from(config: &AudioConfig) -> Self {
        Self {
            min_duration_secs: config.min_duration_secs,
            max_duration_secs: config.max_duration_secs,
            target_sample_rate: config.target_sample_rate,
            target_channels: config.target_channels,
            target_bit_depth: config.target_bit_depth,
        }
    }
}

/// 根据电平统计和格式估算质量分（0.0 - 1.0）
pub fn quality_score(info: &AudioInfo, requirements: &SampleRequirements) -> f32 {
    if info.rms < SILENCE_RMS {
        return 0.0;
    }

    let mut score = 1.0_f32;
    score -= (info.clipped_ratio * 100.0).min(0.4);
    if info.peak < LOW_PEAK {
        score -= 0.2;
    }
    if info.sample_rate < requirements.target_sample_rate {
        score -= 0.1;
    }
    if info.duration_secs < requirements.min_duration_secs
        || info.duration_secs > requirements.max_duration_secs
    {
        score -= 0.2;
    }
    score.clamp(0.0, 1.0)
}

/// Sample Validator
pub struct SampleValidator {
    inspector: Arc<dyn AudioInspectorPort>,
    requirements: SampleRequirements,
}

impl SampleValidator {
    pub fn new(inspector: Arc<dyn AudioInspectorPort>, requirements: SampleRequirements) -> Self {
        Self {
            inspector,
            requirements,
        }
    }

    pub fn requirements(&self) -> &SampleRequirements {
        &self.requirements
    }

    /// 校验单个文件
    pub fn validate_sample(&self, path: &Path) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.insert_metadata("path", path.display().to_string());

        if !path.is_file() {
            result.add_error(format!("File not found: {}", path.display()));
            return result;
        }

        let Some(format) = AudioFormat::from_path(path) else {
            result.add_error(format!(
                "Unsupported file format: {}",
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("(none)")
            ));
            return result;
        };
        result.insert_metadata("format", format.extension());

        let info = match self.inspector.inspect(path) {
            Ok(info) => info,
            Err(e) => {
                result.add_error(format!("Cannot decode audio: {}", e));
                return result;
            }
        };

        self.check_info(&info, &mut result);
        tracing::debug!(
            path = %path.display(),
            valid = result.is_valid(),
            warnings = result.warnings.len(),
            "Sample validated"
        );
        result
    }

    /// 校验多个文件，结果按文件名前缀合并
    pub fn validate_many(&self, paths: &[impl AsRef<Path>]) -> ValidationResult {
        let mut combined = ValidationResult::new();
        if paths.is_empty() {
            combined.add_error("No samples given");
            return combined;
        }

        let mut total_duration = 0.0;
        for path in paths {
            let path = path.as_ref();
            let result = self.validate_sample(path);
            if let Some(d) = result.metadata.get("duration_secs").and_then(|v| v.as_f64()) {
                total_duration += d;
            }
            let label = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            combined.merge(&label, result);
        }

        combined.insert_metadata("sample_count", paths.len());
        combined.insert_metadata("total_duration_secs", total_duration);
        combined
    }

    fn check_info(&self, info: &AudioInfo, result: &mut ValidationResult) {
        let req = &self.requirements;
        let score = quality_score(info, req);

        result.insert_metadata("duration_secs", info.duration_secs);
        result.insert_metadata("sample_rate", info.sample_rate);
        result.insert_metadata("channels", info.channels);
        result.insert_metadata("bit_depth", json!(info.bit_depth));
        result.insert_metadata("peak", json!(info.peak));
        result.insert_metadata("rms", json!(info.rms));
        result.insert_metadata("quality_score", json!(score));

        if info.duration_secs < req.min_duration_secs {
            result.add_error(format!(
                "Too short: {:.2}s (minimum {:.1}s)",
                info.duration_secs, req.min_duration_secs
            ));
        } else if info.duration_secs > req.max_duration_secs {
            result.add_error(format!(
                "Too long: {:.2}s (maximum {:.1}s)",
                info.duration_secs, req.max_duration_secs
            ));
        }

        if info.rms < SILENCE_RMS {
            result.add_error("Audio is silent");
        } else if info.peak < LOW_PEAK {
            result.add_warning(format!("Low level: peak {:.3}", info.peak));
        }

        if info.clipped_ratio > CLIPPING_RATIO {
            result.add_warning(format!(
                "Clipping detected in {:.2}% of samples",
                info.clipped_ratio * 100.0
            ));
        }

        if info.sample_rate != req.target_sample_rate {
            result.add_warning(format!(
                "Sample rate {} Hz differs from target {} Hz (will be converted)",
                info.sample_rate, req.target_sample_rate
            ));
        }

        if info.channels != req.target_channels {
            result.add_warning(format!(
                "{} channel(s), target is {} (will be converted)",
                info.channels, req.target_channels
            ));
        }

        if let Some(bits) = info.bit_depth {
            if bits != req.target_bit_depth {
                result.add_warning(format!(
                    "Bit depth {} differs from target {} (will be converted)",
                    bits, req.target_bit_depth
                ));
            }
        }
    }
}
