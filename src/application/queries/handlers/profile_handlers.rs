//! Profile Query Handlers

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::ProfileRepositoryPort;
use crate::application::queries::{GetProfile, ListProfiles};
use crate::domain::voice::{AudioSample, ProfileId, VoiceProfile};

// ============================================================================
// Response DTOs
// ============================================================================

/// 样本信息
#[derive(Debug, Clone, Serialize)]
pub struct SampleResponse {
    pub path: PathBuf,
    pub duration_secs: f64,
    pub emotion: String,
    pub quality_score: f32,
}

impl From<&AudioSample> for SampleResponse {
    fn from(sample: &AudioSample) -> Self {
        Self {
            path: sample.path().to_path_buf(),
            duration_secs: sample.duration_secs(),
            emotion: sample.emotion().to_string(),
            quality_score: sample.quality_score(),
        }
    }
}

/// 档案详情响应
#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub name: String,
    pub language: String,
    pub reference_text: Option<String>,
    pub sample_rate: u32,
    pub total_duration_secs: f64,
    pub created_at: String,
    pub samples: Vec<SampleResponse>,
}

impl From<&VoiceProfile> for ProfileResponse {
    fn from(profile: &VoiceProfile) -> Self {
        Self {
            id: profile.id().to_string(),
            name: profile.name().to_string(),
            language: profile.language().to_string(),
            reference_text: profile.reference_text().map(str::to_string),
            sample_rate: profile.sample_rate(),
            total_duration_secs: profile.total_duration_secs(),
            created_at: profile.created_at().to_rfc3339(),
            samples: profile.samples().iter().map(SampleResponse::from).collect(),
        }
    }
}

impl fmt::Display for ProfileResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.name, self.id)?;
        writeln!(f, "  language:    {}", self.language)?;
        writeln!(f, "  sample rate: {} Hz", self.sample_rate)?;
        writeln!(f, "  duration:    {:.1}s", self.total_duration_secs)?;
        writeln!(f, "  created:     {}", self.created_at)?;
        if let Some(text) = &self.reference_text {
            writeln!(f, "  transcript:  {}", text)?;
        }
        writeln!(f, "  samples ({}):", self.samples.len())?;
        for sample in &self.samples {
            writeln!(
                f,
                "    {} {:.1}s [{}] quality {:.2}",
                sample.path.display(),
                sample.duration_secs,
                sample.emotion,
                sample.quality_score
            )?;
        }
        Ok(())
    }
}

/// 档案列表项
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    pub id: String,
    pub name: String,
    pub language: String,
    pub sample_count: usize,
    pub total_duration_secs: f64,
    pub created_at: String,
}

impl From<&VoiceProfile> for ProfileSummary {
    fn from(profile: &VoiceProfile) -> Self {
        Self {
            id: profile.id().to_string(),
            name: profile.name().to_string(),
            language: profile.language().to_string(),
            sample_count: profile.samples().len(),
            total_duration_secs: profile.total_duration_secs(),
            created_at: profile.created_at().to_rfc3339(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// 解析档案标识，非法标识视为验证错误
pub(crate) fn parse_profile_id(id: &str) -> Result<ProfileId, ApplicationError> {
    ProfileId::parse(id.trim()).map_err(ApplicationError::from)
}

/// GetProfile Handler
pub struct GetProfileHandler {
    profile_repo: Arc<dyn ProfileRepositoryPort>,
}

impl GetProfileHandler {
    pub fn new(profile_repo: Arc<dyn ProfileRepositoryPort>) -> Self {
        Self { profile_repo }
    }

    /// 加载完整档案（生成时使用）
    pub async fn load(&self, query: GetProfile) -> Result<VoiceProfile, ApplicationError> {
        let id = parse_profile_id(&query.id)?;
        self.profile_repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Profile", id.as_str()))
    }

    pub async fn handle(&self, query: GetProfile) -> Result<ProfileResponse, ApplicationError> {
        let profile = self.load(query).await?;
        Ok(ProfileResponse::from(&profile))
    }
}

/// ListProfiles Handler
pub struct ListProfilesHandler {
    profile_repo: Arc<dyn ProfileRepositoryPort>,
}

impl ListProfilesHandler {
    pub fn new(profile_repo: Arc<dyn ProfileRepositoryPort>) -> Self {
        Self { profile_repo }
    }

    pub async fn handle(&self, _query: ListProfiles) -> Result<Vec<ProfileSummary>, ApplicationError> {
        let profiles = self.profile_repo.find_all().await?;
        Ok(profiles.iter().map(ProfileSummary::from).collect())
    }
}
