//! Profile Command Handlers

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::commands::{CreateProfile, DeleteProfile};
use crate::application::error::ApplicationError;
use crate::application::ports::{AudioInfo, AudioInspectorPort, ProfileRepositoryPort};
use crate::application::queries::handlers::{parse_profile_id, ProfileResponse};
use crate::application::services::{quality_score, SamplePreparer, SampleValidator};
use crate::domain::voice::{AudioSample, ProfileId, ProfileName, VoiceProfile, DEFAULT_LANGUAGE};

// ============================================================================
// CreateProfile
// ============================================================================

/// 创建档案响应
#[derive(Debug, Clone)]
pub struct CreateProfileResponse {
    pub profile: ProfileResponse,
    /// 校验阶段的警告
    pub warnings: Vec<String>,
}

/// CreateProfile Handler
pub struct CreateProfileHandler {
    profile_repo: Arc<dyn ProfileRepositoryPort>,
    validator: Arc<SampleValidator>,
    preparer: Arc<SamplePreparer>,
    inspector: Arc<dyn AudioInspectorPort>,
    samples_dir: PathBuf,
}

impl CreateProfileHandler {
    pub fn new(
        profile_repo: Arc<dyn ProfileRepositoryPort>,
        validator: Arc<SampleValidator>,
        preparer: Arc<SamplePreparer>,
        inspector: Arc<dyn AudioInspectorPort>,
        samples_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            profile_repo,
            validator,
            preparer,
            inspector,
            samples_dir: samples_dir.into(),
        }
    }

    pub async fn handle(
        &self,
        command: CreateProfile,
    ) -> Result<CreateProfileResponse, ApplicationError> {
        let name = ProfileName::new(command.name)?;
        let id = ProfileId::from_name(&name);

        if command.samples.is_empty() {
            return Err(ApplicationError::validation("At least one sample is required"));
        }

        let report = self.validator.validate_many(&command.samples);
        if !report.is_valid() {
            return Err(ApplicationError::validation(format!(
                "Sample validation failed\n{}",
                report
            )));
        }
        for warning in &report.warnings {
            tracing::warn!(profile = %id, "{}", warning);
        }

        let emotion = command.emotion.filter(|e| !e.trim().is_empty());
        let mut samples = Vec::with_capacity(command.samples.len());
        for (index, source) in command.samples.iter().enumerate() {
            let (path, info) = if command.prepare {
                let target = self
                    .samples_dir
                    .join(id.as_str())
                    .join(format!("sample_{}.wav", index + 1));
                let info = self.preparer.prepare(source, &target).await?;
                (target, info)
            } else {
                (absolute(source).await, self.inspect(source)?)
            };

            let score = quality_score(&info, self.validator.requirements());
            let mut sample = AudioSample::new(
                path,
                info.duration_secs,
                info.sample_rate,
                info.channels,
                info.bit_depth.unwrap_or(16),
            )?
            .with_quality_score(score);
            if let Some(emotion) = &emotion {
                sample = sample.with_emotion(emotion.as_str());
            }
            samples.push(sample);
        }

        let language = command
            .language
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        let profile = VoiceProfile::new(name, samples, language, command.reference_text)?;
        self.profile_repo.save(&profile).await?;

        tracing::info!(
            profile = %profile.id(),
            name = %profile.name(),
            samples = profile.samples().len(),
            duration_secs = profile.total_duration_secs(),
            "Profile created"
        );

        Ok(CreateProfileResponse {
            profile: ProfileResponse::from(&profile),
            warnings: report.warnings,
        })
    }

    fn inspect(&self, path: &Path) -> Result<AudioInfo, ApplicationError> {
        self.inspector
            .inspect(path)
            .map_err(|e| ApplicationError::AudioError(e.to_string()))
    }
}

/// 档案中保存绝对路径，避免依赖当前工作目录
async fn absolute(path: &Path) -> PathBuf {
    tokio::fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf())
}

// ============================================================================
// DeleteProfile
// ============================================================================

/// DeleteProfile Handler
pub struct DeleteProfileHandler {
    profile_repo: Arc<dyn ProfileRepositoryPort>,
    samples_dir: PathBuf,
}

impl DeleteProfileHandler {
    pub fn new(profile_repo: Arc<dyn ProfileRepositoryPort>, samples_dir: impl Into<PathBuf>) -> Self {
        Self {
            profile_repo,
            samples_dir: samples_dir.into(),
        }
    }

    pub async fn handle(&self, command: DeleteProfile) -> Result<(), ApplicationError> {
        let id = parse_profile_id(&command.id)?;

        let profile = self
            .profile_repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Profile", id.as_str()))?;

        self.profile_repo.delete(&id).await?;

        // 预处理样本目录
        let prepared = self.samples_dir.join(id.as_str());
        if tokio::fs::try_exists(&prepared).await.unwrap_or(false) {
            if let Err(e) = tokio::fs::remove_dir_all(&prepared).await {
                tracing::warn!(path = %prepared.display(), error = %e, "Failed to remove prepared samples");
            }
        }

        tracing::info!(profile = %id, name = %profile.name(), "Profile deleted");
        Ok(())
    }
}
