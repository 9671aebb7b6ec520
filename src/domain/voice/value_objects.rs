//! Voice Context - Value Objects

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::ProfileError;

/// 默认情绪标签
pub const DEFAULT_EMOTION: &str = "neutral";

/// 档案唯一标识
///
/// 由档案名称生成的 slug：小写，非 `[a-z0-9_]` 字符替换为 `_`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    /// 从名称生成标识
    pub fn from_name(name: &ProfileName) -> Self {
        let slug: String = name
            .as_str()
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        Self(slug)
    }

    /// 解析已有标识（来自命令行或存储）
    pub fn parse(id: impl Into<String>) -> Result<Self, ProfileError> {
        let id = id.into();
        if id.is_empty()
            || !id
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(ProfileError::InvalidId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 档案名称
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileName(String);

impl ProfileName {
    pub fn new(name: impl Into<String>) -> Result<Self, ProfileError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ProfileError::InvalidName("档案名称不能为空".to_string()));
        }
        if name.chars().count() > 100 {
            return Err(ProfileError::InvalidName(
                "档案名称长度不能超过100字符".to_string(),
            ));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProfileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 参考音频文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Wav,
    Mp3,
    Flac,
    Ogg,
    M4a,
}

impl AudioFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "wav" => Some(Self::Wav),
            "mp3" => Some(Self::Mp3),
            "flac" => Some(Self::Flac),
            "ogg" => Some(Self::Ogg),
            "m4a" => Some(Self::M4a),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::Ogg => "ogg",
            Self::M4a => "m4a",
        }
    }
}

/// 参考音频样本
///
/// 不变量:
/// - duration_secs > 0
/// - 附加到档案后不可修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSample {
    path: PathBuf,
    duration_secs: f64,
    sample_rate: u32,
    channels: u16,
    bit_depth: u16,
    emotion: String,
    quality_score: f32,
}

impl AudioSample {
    pub fn new(
        path: PathBuf,
        duration_secs: f64,
        sample_rate: u32,
        channels: u16,
        bit_depth: u16,
    ) -> Result<Self, ProfileError> {
        if !(duration_secs > 0.0) {
            return Err(ProfileError::InvalidSample(format!(
                "{}: duration must be positive",
                path.display()
            )));
        }
        Ok(Self {
            path,
            duration_secs,
            sample_rate,
            channels,
            bit_depth,
            emotion: DEFAULT_EMOTION.to_string(),
            quality_score: 1.0,
        })
    }

    pub fn with_emotion(mut self, emotion: impl Into<String>) -> Self {
        self.emotion = emotion.into();
        self
    }

    pub fn with_quality_score(mut self, score: f32) -> Self {
        self.quality_score = score.clamp(0.0, 1.0);
        self
    }

    // Getters
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn bit_depth(&self) -> u16 {
        self.bit_depth
    }

    pub fn emotion(&self) -> &str {
        &self.emotion
    }

    pub fn quality_score(&self) -> f32 {
        self.quality_score
    }
}
