//! WAV File Storage - 基于 hound 的 WAV 写入
//!
//! 实现 AudioStoragePort。先写同目录下的临时文件，完成后 rename 覆盖目标，
//! 失败时目标路径保持原样。

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::application::ports::{AudioStorageError, AudioStoragePort};
use crate::domain::AudioBuffer;

/// WAV 文件存储
#[derive(Debug, Clone)]
pub struct WavFileStorage {
    bit_depth: u16,
}

impl WavFileStorage {
    /// `bit_depth`: 16 / 24 为整数 PCM，32 为浮点
    pub fn new(bit_depth: u16) -> Self {
        Self { bit_depth }
    }

    fn spec(&self, sample_rate: u32) -> Result<hound::WavSpec, AudioStorageError> {
        let sample_format = match self.bit_depth {
            16 | 24 => hound::SampleFormat::Int,
            32 => hound::SampleFormat::Float,
            other => {
                return Err(AudioStorageError::EncodingError(format!(
                    "Unsupported bit depth: {}",
                    other
                )))
            }
        };
        Ok(hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: self.bit_depth,
            sample_format,
        })
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio.wav".to_string());
    path.with_file_name(format!(".{}.{}.part", name, uuid::Uuid::new_v4().simple()))
}

fn encode(path: &Path, spec: hound::WavSpec, samples: &[f32]) -> Result<(), hound::Error> {
    let mut writer = hound::WavWriter::create(path, spec)?;
    match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, _) => {
            for &s in samples {
                writer.write_sample(s.clamp(-1.0, 1.0))?;
            }
        }
        (_, 24) => {
            let scale = 8_388_607.0_f32;
            for &s in samples {
                writer.write_sample((s.clamp(-1.0, 1.0) * scale) as i32)?;
            }
        }
        _ => {
            for &s in samples {
                writer.write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
            }
        }
    }
    writer.finalize()
}

#[async_trait]
impl AudioStoragePort for WavFileStorage {
    async fn write_wav(&self, path: &Path, audio: &AudioBuffer) -> Result<u64, AudioStorageError> {
        let spec = self.spec(audio.sample_rate)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AudioStorageError::IoError(e.to_string()))?;
        }

        let tmp = temp_path(path);
        let tmp_for_task = tmp.clone();
        let samples = audio.samples.clone();
        let encoded = tokio::task::spawn_blocking(move || encode(&tmp_for_task, spec, &samples))
            .await
            .map_err(|e| AudioStorageError::IoError(format!("Encoder task failed: {}", e)))?;

        if let Err(e) = encoded {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(AudioStorageError::EncodingError(e.to_string()));
        }

        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(AudioStorageError::IoError(e.to_string()));
        }

        let size = tokio::fs::metadata(path)
            .await
            .map(|m| m.len())
            .map_err(|e| AudioStorageError::IoError(e.to_string()))?;

        tracing::debug!(
            path = %path.display(),
            samples = audio.len(),
            sample_rate = audio.sample_rate,
            size,
            "WAV written"
        );

        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a/b/out.wav");
        let audio = AudioBuffer::new(vec![0.0, 0.5, -0.5, 1.0], 24000);

        let size = WavFileStorage::new(16).write_wav(&path, &audio).await.unwrap();
        assert_eq!(size, std::fs::metadata(&path).unwrap().len());

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 24000);
        assert_eq!(reader.spec().channels, 1);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 16383, -16383, i16::MAX]);
    }

    #[tokio::test]
    async fn test_no_temp_files_left() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let storage = WavFileStorage::new(32);

        storage
            .write_wav(&path, &AudioBuffer::new(vec![0.1; 100], 16000))
            .await
            .unwrap();
        storage
            .write_wav(&path, &AudioBuffer::new(vec![0.2; 50], 16000))
            .await
            .unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(hound::WavReader::open(&path).unwrap().len(), 50);
    }

    #[tokio::test]
    async fn test_empty_audio_is_valid_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.wav");

        WavFileStorage::new(16)
            .write_wav(&path, &AudioBuffer::new(Vec::new(), 24000))
            .await
            .unwrap();
        assert_eq!(hound::WavReader::open(&path).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_bit_depth() {
        let dir = tempdir().unwrap();
        let err = WavFileStorage::new(12)
            .write_wav(&dir.path().join("x.wav"), &AudioBuffer::new(vec![0.0], 8000))
            .await
            .unwrap_err();
        assert!(matches!(err, AudioStorageError::EncodingError(_)));
    }
}
