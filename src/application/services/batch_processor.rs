//! Batch Processor - 按脚本批量生成
//!
//! 每个片段生成一个输出文件；单个片段失败只记录在报告中，不中断后续片段。

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::services::VoiceGenerator;
use crate::domain::voice::VoiceProfile;
use crate::domain::{disambiguate_filenames, GenerationMode, ScriptSegment};

/// 成功生成的片段
#[derive(Debug, Clone, Serialize)]
pub struct ProducedFile {
    pub marker: String,
    pub path: PathBuf,
    pub duration_secs: f64,
}

/// 失败的片段
#[derive(Debug, Clone, Serialize)]
pub struct SegmentFailure {
    pub marker: String,
    pub output_filename: String,
    pub reason: String,
}

/// 批量生成报告
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub produced: Vec<ProducedFile>,
    pub failures: Vec<SegmentFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.produced.len() + self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn produced_files(&self) -> Vec<&Path> {
        self.produced.iter().map(|p| p.path.as_path()).collect()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Batch: {}/{} segments generated",
            self.produced.len(),
            self.total()
        )?;

        for file in &self.produced {
            writeln!(
                f,
                "  [ok]   {} -> {} ({:.1}s)",
                file.marker,
                file.path.display(),
                file.duration_secs
            )?;
        }

        for failure in &self.failures {
            writeln!(
                f,
                "  [fail] {} -> {}: {}",
                failure.marker, failure.output_filename, failure.reason
            )?;
        }

        Ok(())
    }
}

/// Batch Processor
pub struct BatchProcessor {
    generator: Arc<VoiceGenerator>,
    unique_output_names: bool,
}

impl BatchProcessor {
    pub fn new(generator: Arc<VoiceGenerator>, unique_output_names: bool) -> Self {
        Self {
            generator,
            unique_output_names,
        }
    }

    /// 依次生成每个片段
    pub async fn process(
        &self,
        segments: &[ScriptSegment],
        profile: &VoiceProfile,
        output_dir: &Path,
    ) -> BatchReport {
        let mut segments = segments.to_vec();
        if self.unique_output_names {
            disambiguate_filenames(&mut segments);
        }

        let total = segments.len();
        let mut report = BatchReport::default();

        tracing::info!(
            profile = %profile.id(),
            segments = total,
            output_dir = %output_dir.display(),
            "Starting batch"
        );

        for (index, segment) in segments.into_iter().enumerate() {
            let output_path = output_dir.join(&segment.output_filename);
            tracing::info!(
                index = index + 1,
                total,
                marker = %segment.marker,
                "Generating segment"
            );

            match self
                .generator
                .try_generate(GenerationMode::Clone, &segment.text, profile, &output_path)
                .await
            {
                Ok(outcome) => report.produced.push(ProducedFile {
                    marker: segment.marker,
                    path: outcome.output_path,
                    duration_secs: outcome.duration_secs,
                }),
                Err(e) => {
                    tracing::warn!(marker = %segment.marker, error = %e, "Segment failed");
                    report.failures.push(SegmentFailure {
                        marker: segment.marker,
                        output_filename: segment.output_filename,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            produced = report.produced.len(),
            failed = report.failures.len(),
            "Batch completed"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{DevicePreference, Precision};
    use crate::application::services::test_support::{profile_with_samples, ScriptedBackend};
    use crate::application::services::{GeneratorConfig, ModelManager, ModelManagerConfig};
    use crate::domain::parse_script;
    use crate::infrastructure::adapters::WavFileStorage;
    use tempfile::tempdir;

    async fn processor(backend: Arc<ScriptedBackend>, unique: bool) -> BatchProcessor {
        let manager = ModelManager::new(
            ModelManagerConfig {
                model_name: "test-model".to_string(),
                cache_dir: PathBuf::from("models"),
                device: DevicePreference::Cpu,
                precision: Precision::Float32,
                force_fp32_on_mps: false,
            },
            backend,
        )
        .await;
        assert!(manager.load().await);

        let generator = VoiceGenerator::new(
            GeneratorConfig {
                max_chunk_length: 200,
                max_reference_samples: 3,
                output_sample_rate: 24000,
            },
            Arc::new(manager),
            Arc::new(WavFileStorage::new(16)),
        );
        BatchProcessor::new(Arc::new(generator), unique)
    }

    #[tokio::test]
    async fn test_failed_segment_does_not_stop_batch() {
        let backend = Arc::new(ScriptedBackend::failing_on("FAIL"));
        let processor = processor(backend, false).await;
        let dir = tempdir().unwrap();

        let segments = parse_script("[ONE]\nFirst.\n[TWO]\nFAIL here.\n[THREE]\nThird.\n");
        let report = processor
            .process(&segments, &profile_with_samples(1), dir.path())
            .await;

        assert_eq!(report.produced.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].marker, "TWO");
        assert!(!report.is_complete());

        assert!(dir.path().join("one.wav").exists());
        assert!(!dir.path().join("two.wav").exists());
        assert!(dir.path().join("three.wav").exists());

        let rendered = report.to_string();
        assert!(rendered.contains("2/3"));
        assert!(rendered.contains("TWO"));
    }

    #[tokio::test]
    async fn test_unique_names_keep_duplicates() {
        let processor = processor(Arc::new(ScriptedBackend::default()), true).await;
        let dir = tempdir().unwrap();

        let segments = parse_script("[A]\nOne.\n[A]\nTwo.\n");
        let report = processor
            .process(&segments, &profile_with_samples(1), dir.path())
            .await;

        assert!(report.is_complete());
        let first = dir.path().join("a.wav");
        let second = dir.path().join("a_2.wav");
        assert_eq!(report.produced_files(), vec![first.as_path(), second.as_path()]);
    }

    #[tokio::test]
    async fn test_empty_script_yields_empty_report() {
        let processor = processor(Arc::new(ScriptedBackend::default()), false).await;
        let dir = tempdir().unwrap();

        let report = processor.process(&[], &profile_with_samples(1), dir.path()).await;
        assert_eq!(report.total(), 0);
        assert!(report.is_complete());
    }
}
