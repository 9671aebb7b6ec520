//! Voice Context - Aggregate Root

use chrono::{DateTime, Utc};
use std::path::Path;

use super::{AudioSample, ProfileError, ProfileId, ProfileName};

/// 默认语言
pub const DEFAULT_LANGUAGE: &str = "en";

/// VoiceProfile 聚合根
///
/// 不变量:
/// - 至少包含一个参考音频
/// - 创建后只读；需要修改时重新创建
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceProfile {
    id: ProfileId,
    name: ProfileName,
    samples: Vec<AudioSample>,
    created_at: DateTime<Utc>,
    language: String,
    reference_text: Option<String>,
    sample_rate: u32,
}

impl VoiceProfile {
    /// 创建新档案
    pub fn new(
        name: ProfileName,
        samples: Vec<AudioSample>,
        language: impl Into<String>,
        reference_text: Option<String>,
    ) -> Result<Self, ProfileError> {
        let id = ProfileId::from_name(&name);
        Self::restore(id, name, samples, Utc::now(), language, reference_text)
    }

    /// 从持久化数据恢复档案
    pub fn restore(
        id: ProfileId,
        name: ProfileName,
        samples: Vec<AudioSample>,
        created_at: DateTime<Utc>,
        language: impl Into<String>,
        reference_text: Option<String>,
    ) -> Result<Self, ProfileError> {
        let first = samples.first().ok_or(ProfileError::NoSamples)?;
        let sample_rate = first.sample_rate();
        let language = language.into();
        let language = if language.trim().is_empty() {
            DEFAULT_LANGUAGE.to_string()
        } else {
            language
        };
        let reference_text = reference_text.filter(|t| !t.trim().is_empty());

        Ok(Self {
            id,
            name,
            samples,
            created_at,
            language,
            reference_text,
            sample_rate,
        })
    }

    /// 所有参考音频的总时长（秒）
    pub fn total_duration_secs(&self) -> f64 {
        self.samples.iter().map(AudioSample::duration_secs).sum()
    }

    /// 前 `limit` 个参考音频路径（送入模型的参考）
    pub fn reference_paths(&self, limit: usize) -> Vec<&Path> {
        self.samples.iter().take(limit).map(AudioSample::path).collect()
    }

    // Getters
    pub fn id(&self) -> &ProfileId {
        &self.id
    }

    pub fn name(&self) -> &ProfileName {
        &self.name
    }

    pub fn samples(&self) -> &[AudioSample] {
        &self.samples
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn reference_text(&self) -> Option<&str> {
        self.reference_text.as_deref()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

#[cfg(test)]
impl VoiceProfile {
    /// 绕过不变量构造空档案，用于测试生成前置检查
    pub(crate) fn with_samples_cleared(mut self) -> Self {
        self.samples.clear();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample(path: &str, duration: f64) -> AudioSample {
        AudioSample::new(PathBuf::from(path), duration, 24000, 1, 16).unwrap()
    }

    #[test]
    fn test_profile_creation() {
        let name = ProfileName::new("Narrator").unwrap();
        let profile = VoiceProfile::new(
            name,
            vec![sample("a.wav", 3.0), sample("b.wav", 4.5)],
            "en",
            Some("Hello there".to_string()),
        )
        .unwrap();

        assert_eq!(profile.id().as_str(), "narrator");
        assert_eq!(profile.sample_rate(), 24000);
        assert!((profile.total_duration_secs() - 7.5).abs() < 1e-9);
        assert_eq!(profile.reference_text(), Some("Hello there"));
    }

    #[test]
    fn test_profile_requires_samples() {
        let name = ProfileName::new("Empty").unwrap();
        let result = VoiceProfile::new(name, Vec::new(), "en", None);
        assert!(matches!(result, Err(ProfileError::NoSamples)));
    }

    #[test]
    fn test_reference_paths_capped() {
        let name = ProfileName::new("Many").unwrap();
        let samples = (0..5).map(|i| sample(&format!("{}.wav", i), 2.0)).collect();
        let profile = VoiceProfile::new(name, samples, "", None).unwrap();

        let refs = profile.reference_paths(3);
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0], Path::new("0.wav"));
        assert_eq!(profile.language(), DEFAULT_LANGUAGE);
    }
}
