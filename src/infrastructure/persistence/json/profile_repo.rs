//! JSON Profile Repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::application::ports::{ProfileRepositoryPort, RepositoryError};
use crate::domain::voice::{
    AudioSample, ProfileId, ProfileName, VoiceProfile, DEFAULT_EMOTION, DEFAULT_LANGUAGE,
};

/// 预处理后的样本固定为单声道 16 位
const STORED_CHANNELS: u16 = 1;
const STORED_BIT_DEPTH: u16 = 16;

/// JSON Profile Repository
pub struct JsonProfileRepository {
    dir: PathBuf,
}

impl JsonProfileRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn document_path(&self, id: &ProfileId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    async fn read_document(path: &Path) -> Result<VoiceProfile, RepositoryError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| RepositoryError::IoError(e.to_string()))?;
        let doc: ProfileDocument = serde_json::from_slice(&bytes)
            .map_err(|e| RepositoryError::CorruptDocument(format!("{}: {}", path.display(), e)))?;
        doc.into_profile()
            .map_err(|e| RepositoryError::CorruptDocument(format!("{}: {}", path.display(), e)))
    }
}

#[derive(Serialize, Deserialize)]
struct SampleDocument {
    path: PathBuf,
    duration: f64,
    #[serde(default = "default_emotion")]
    emotion: String,
    #[serde(default = "default_quality")]
    quality_score: f32,
}

#[derive(Serialize, Deserialize)]
struct ProfileDocument {
    name: String,
    id: String,
    created_at: DateTime<Utc>,
    #[serde(default = "default_language")]
    language: String,
    #[serde(default)]
    reference_text: Option<String>,
    sample_rate: u32,
    #[serde(default)]
    total_duration: f64,
    samples: Vec<SampleDocument>,
}

fn default_emotion() -> String {
    DEFAULT_EMOTION.to_string()
}

fn default_quality() -> f32 {
    1.0
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

impl From<&VoiceProfile> for ProfileDocument {
    fn from(profile: &VoiceProfile) -> Self {
        Self {
            name: profile.name().to_string(),
            id: profile.id().to_string(),
            created_at: profile.created_at(),
            language: profile.language().to_string(),
            reference_text: profile.reference_text().map(str::to_string),
            sample_rate: profile.sample_rate(),
            total_duration: profile.total_duration_secs(),
            samples: profile
                .samples()
                .iter()
                .map(|s| SampleDocument {
                    path: s.path().to_path_buf(),
                    duration: s.duration_secs(),
                    emotion: s.emotion().to_string(),
                    quality_score: s.quality_score(),
                })
                .collect(),
        }
    }
}

impl ProfileDocument {
    fn into_profile(self) -> Result<VoiceProfile, crate::domain::voice::ProfileError> {
        let id = ProfileId::parse(self.id)?;
        let name = ProfileName::new(self.name)?;
        let sample_rate = self.sample_rate;
        let samples = self
            .samples
            .into_iter()
            .map(|s| {
                AudioSample::new(s.path, s.duration, sample_rate, STORED_CHANNELS, STORED_BIT_DEPTH)
                    .map(|sample| {
                        sample
                            .with_emotion(s.emotion)
                            .with_quality_score(s.quality_score)
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        VoiceProfile::restore(
            id,
            name,
            samples,
            self.created_at,
            self.language,
            self.reference_text,
        )
    }
}

#[async_trait]
impl ProfileRepositoryPort for JsonProfileRepository {
    async fn save(&self, profile: &VoiceProfile) -> Result<(), RepositoryError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| RepositoryError::IoError(e.to_string()))?;

        let doc = ProfileDocument::from(profile);
        let json = serde_json::to_vec_pretty(&doc)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

        let path = self.document_path(profile.id());
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", profile.id(), uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| RepositoryError::IoError(e.to_string()))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(RepositoryError::IoError(e.to_string()));
        }

        tracing::debug!(id = %profile.id(), path = %path.display(), "Profile saved");
        Ok(())
    }

    async fn find_by_id(&self, id: &ProfileId) -> Result<Option<VoiceProfile>, RepositoryError> {
        let path = self.document_path(id);
        if !tokio::fs::try_exists(&path)
            .await
            .map_err(|e| RepositoryError::IoError(e.to_string()))?
        {
            return Ok(None);
        }
        Self::read_document(&path).await.map(Some)
    }

    async fn find_all(&self) -> Result<Vec<VoiceProfile>, RepositoryError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RepositoryError::IoError(e.to_string())),
        };

        let mut profiles = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RepositoryError::IoError(e.to_string()))?
        {
            let path = entry.path();
            let is_document = path.extension().is_some_and(|e| e == "json")
                && !path
                    .file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with('.'));
            if !is_document {
                continue;
            }

            match Self::read_document(&path).await {
                Ok(profile) => profiles.push(profile),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable profile"),
            }
        }

        profiles.sort_by(|a, b| a.name().as_str().cmp(b.name().as_str()));
        Ok(profiles)
    }

    async fn delete(&self, id: &ProfileId) -> Result<(), RepositoryError> {
        match tokio::fs::remove_file(self.document_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RepositoryError::NotFound(id.to_string()))
            }
            Err(e) => Err(RepositoryError::IoError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn profile(name: &str) -> VoiceProfile {
        let samples = vec![
            AudioSample::new(PathBuf::from("a.wav"), 3.5, 24000, 1, 16)
                .unwrap()
                .with_emotion("happy")
                .with_quality_score(0.9),
            AudioSample::new(PathBuf::from("b.wav"), 4.0, 24000, 1, 16).unwrap(),
        ];
        VoiceProfile::new(
            ProfileName::new(name).unwrap(),
            samples,
            "en",
            Some("hello world".to_string()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let dir = tempdir().unwrap();
        let repo = JsonProfileRepository::new(dir.path());
        let original = profile("My Voice");

        repo.save(&original).await.unwrap();
        assert!(dir.path().join("my_voice.json").exists());

        let loaded = repo.find_by_id(original.id()).await.unwrap().unwrap();
        assert_eq!(loaded, original);
        assert_eq!(loaded.samples()[0].emotion(), "happy");
        assert!((loaded.total_duration_secs() - 7.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_document_format() {
        let dir = tempdir().unwrap();
        let repo = JsonProfileRepository::new(dir.path());
        repo.save(&profile("Doc")).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("doc.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["id"], "doc");
        assert_eq!(value["sample_rate"], 24000);
        assert_eq!(value["total_duration"], 7.5);
        assert_eq!(value["samples"][0]["duration"], 3.5);
        assert_eq!(value["samples"][1]["emotion"], "neutral");
        assert!(value["created_at"].is_string());
    }

    #[tokio::test]
    async fn test_find_missing() {
        let dir = tempdir().unwrap();
        let repo = JsonProfileRepository::new(dir.path().join("none"));
        let id = ProfileId::parse("ghost").unwrap();

        assert!(repo.find_by_id(&id).await.unwrap().is_none());
        assert!(repo.find_all().await.unwrap().is_empty());
        assert!(matches!(repo.delete(&id).await, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_all_sorted_and_skips_corrupt() {
        let dir = tempdir().unwrap();
        let repo = JsonProfileRepository::new(dir.path());
        repo.save(&profile("Zed")).await.unwrap();
        repo.save(&profile("Alpha")).await.unwrap();
        std::fs::write(dir.path().join("broken.json"), b"{ not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let all = repo.find_all().await.unwrap();
        let names: Vec<&str> = all.iter().map(|p| p.name().as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zed"]);
    }

    #[tokio::test]
    async fn test_save_overwrites_and_delete() {
        let dir = tempdir().unwrap();
        let repo = JsonProfileRepository::new(dir.path());
        let first = profile("Same");
        repo.save(&first).await.unwrap();
        repo.save(&profile("Same")).await.unwrap();

        assert_eq!(repo.find_all().await.unwrap().len(), 1);

        repo.delete(first.id()).await.unwrap();
        assert!(repo.find_by_id(first.id()).await.unwrap().is_none());
    }
}
