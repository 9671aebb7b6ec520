//! Sample Preparer - 参考音频预处理
//!
//! 步骤: 裁剪静音 → 响度归一化 → 淡入淡出 → 转换为目标格式
//!
//! 格式转换放在最后，响度归一化改变的采样率会在这一步恢复。
//! 中间文件写在输出目录旁，结束后删除。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::ports::{
    AudioConverterPort, AudioInfo, AudioInspectorPort, ConvertError, ConvertOptions,
};
use crate::config::AudioConfig;

/// 预处理配置
#[derive(Debug, Clone)]
pub struct PrepareOptions {
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
    pub trim_silence: bool,
    pub normalize_loudness: bool,
    pub loudness_target_lufs: f32,
    pub fade_ms: u32,
}

impl From<&AudioConfig> for PrepareOptions {
    fn from(config: &AudioConfig) -> Self {
        Self {
            sample_rate: config.target_sample_rate,
            channels: config.target_channels,
            bit_depth: config.target_bit_depth,
            trim_silence: config.trim_silence,
            normalize_loudness: config.normalize_loudness,
            loudness_target_lufs: config.loudness_target_lufs,
            fade_ms: config.fade_ms,
        }
    }
}

/// Sample Preparer
pub struct SamplePreparer {
    converter: Arc<dyn AudioConverterPort>,
    inspector: Arc<dyn AudioInspectorPort>,
    options: PrepareOptions,
}

impl SamplePreparer {
    pub fn new(
        converter: Arc<dyn AudioConverterPort>,
        inspector: Arc<dyn AudioInspectorPort>,
        options: PrepareOptions,
    ) -> Self {
        Self {
            converter,
            inspector,
            options,
        }
    }

    /// 处理单个样本，返回处理后文件的信息
    pub async fn prepare(&self, input: &Path, output: &Path) -> Result<AudioInfo, ConvertError> {
        if !input.is_file() {
            return Err(ConvertError::InvalidInput(format!(
                "File not found: {}",
                input.display()
            )));
        }

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ConvertError::IoError(e.to_string()))?;
        }

        let mut intermediates: Vec<PathBuf> = Vec::new();
        let result = self.run_pipeline(input, output, &mut intermediates).await;

        for path in &intermediates {
            if let Err(e) = tokio::fs::remove_file(path).await {
                tracing::debug!(path = %path.display(), error = %e, "Failed to remove intermediate file");
            }
        }

        let info = result?;
        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            duration_secs = info.duration_secs,
            sample_rate = info.sample_rate,
            "Sample prepared"
        );
        Ok(info)
    }

    async fn run_pipeline(
        &self,
        input: &Path,
        output: &Path,
        intermediates: &mut Vec<PathBuf>,
    ) -> Result<AudioInfo, ConvertError> {
        let mut current = input.to_path_buf();

        if self.options.trim_silence {
            let next = intermediate_path(output, "trim");
            intermediates.push(next.clone());
            self.converter.trim_silence(&current, &next).await?;
            current = next;
        }

        if self.options.normalize_loudness {
            let next = intermediate_path(output, "loudnorm");
            intermediates.push(next.clone());
            self.converter
                .normalize_loudness(&current, &next, self.options.loudness_target_lufs)
                .await?;
            current = next;
        }

        if self.options.fade_ms > 0 {
            let duration = self.inspect(&current)?.duration_secs;
            let next = intermediate_path(output, "fade");
            intermediates.push(next.clone());
            self.converter
                .apply_fades(&current, &next, self.options.fade_ms, duration)
                .await?;
            current = next;
        }

        let options = ConvertOptions {
            sample_rate: Some(self.options.sample_rate),
            channels: Some(self.options.channels),
            bit_depth: Some(self.options.bit_depth),
        };
        self.converter.convert(&current, output, &options).await?;

        self.inspect(output)
    }

    fn inspect(&self, path: &Path) -> Result<AudioInfo, ConvertError> {
        self.inspector
            .inspect(path)
            .map_err(|e| ConvertError::InvalidInput(e.to_string()))
    }
}

/// 中间文件路径: `<dir>/.<stem>.<step>.<uuid>.wav`
fn intermediate_path(output: &Path, step: &str) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sample".to_string());
    let name = format!(".{}.{}.{}.wav", stem, step, uuid::Uuid::new_v4().simple());
    match output.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::InspectError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// 记录调用顺序并复制文件的转换器
    #[derive(Default)]
    struct CopyConverter {
        steps: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl CopyConverter {
        async fn step(&self, name: &str, input: &Path, output: &Path) -> Result<(), ConvertError> {
            self.steps.lock().unwrap().push(name.to_string());
            if self.fail_on == Some(name) {
                return Err(ConvertError::Failed {
                    status: "1".to_string(),
                    stderr: "boom".to_string(),
                });
            }
            tokio::fs::copy(input, output)
                .await
                .map(|_| ())
                .map_err(|e| ConvertError::IoError(e.to_string()))
        }
    }

    #[async_trait]
    impl AudioConverterPort for CopyConverter {
        async fn ensure_available(&self) -> Result<String, ConvertError> {
            Ok("copy".to_string())
        }

        async fn convert(
            &self,
            input: &Path,
            output: &Path,
            _options: &ConvertOptions,
        ) -> Result<(), ConvertError> {
            self.step("convert", input, output).await
        }

        async fn apply_fades(
            &self,
            input: &Path,
            output: &Path,
            _fade_ms: u32,
            _duration_secs: f64,
        ) -> Result<(), ConvertError> {
            self.step("fade", input, output).await
        }

        async fn trim_silence(&self, input: &Path, output: &Path) -> Result<(), ConvertError> {
            self.step("trim", input, output).await
        }

        async fn normalize_loudness(
            &self,
            input: &Path,
            output: &Path,
            _target_lufs: f32,
        ) -> Result<(), ConvertError> {
            self.step("loudnorm", input, output).await
        }
    }

    struct StubInspector;

    impl AudioInspectorPort for StubInspector {
        fn inspect(&self, path: &Path) -> Result<AudioInfo, InspectError> {
            if !path.exists() {
                return Err(InspectError::NotFound(path.display().to_string()));
            }
            Ok(AudioInfo {
                duration_secs: 5.0,
                sample_rate: 24000,
                channels: 1,
                bit_depth: Some(16),
                peak: 0.5,
                rms: 0.1,
                clipped_ratio: 0.0,
            })
        }
    }

    fn options() -> PrepareOptions {
        PrepareOptions {
            sample_rate: 24000,
            channels: 1,
            bit_depth: 16,
            trim_silence: true,
            normalize_loudness: true,
            loudness_target_lufs: -16.0,
            fade_ms: 50,
        }
    }

    fn file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_pipeline_order_and_cleanup() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.mp3");
        std::fs::write(&input, b"audio").unwrap();
        let out_dir = dir.path().join("prepared");
        let output = out_dir.join("sample_1.wav");

        let converter = Arc::new(CopyConverter::default());
        let preparer = SamplePreparer::new(converter.clone(), Arc::new(StubInspector), options());

        let info = preparer.prepare(&input, &output).await.unwrap();
        assert_eq!(info.sample_rate, 24000);
        assert!(output.exists());
        assert_eq!(
            *converter.steps.lock().unwrap(),
            vec!["trim", "loudnorm", "fade", "convert"]
        );
        assert_eq!(file_count(&out_dir), 1);
    }

    #[tokio::test]
    async fn test_disabled_steps_skipped() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.wav");
        std::fs::write(&input, b"audio").unwrap();
        let output = dir.path().join("out.wav");

        let converter = Arc::new(CopyConverter::default());
        let preparer = SamplePreparer::new(
            converter.clone(),
            Arc::new(StubInspector),
            PrepareOptions {
                trim_silence: false,
                normalize_loudness: false,
                fade_ms: 0,
                ..options()
            },
        );

        preparer.prepare(&input, &output).await.unwrap();
        assert_eq!(*converter.steps.lock().unwrap(), vec!["convert"]);
    }

    #[tokio::test]
    async fn test_failure_cleans_intermediates() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.wav");
        std::fs::write(&input, b"audio").unwrap();
        let out_dir = dir.path().join("prepared");
        let output = out_dir.join("out.wav");

        let converter = Arc::new(CopyConverter {
            fail_on: Some("fade"),
            ..Default::default()
        });
        let preparer = SamplePreparer::new(converter, Arc::new(StubInspector), options());

        let err = preparer.prepare(&input, &output).await.unwrap_err();
        assert!(matches!(err, ConvertError::Failed { .. }));
        assert!(!output.exists());
        assert_eq!(file_count(&out_dir), 0);
    }

    #[tokio::test]
    async fn test_missing_input() {
        let dir = tempdir().unwrap();
        let preparer = SamplePreparer::new(
            Arc::new(CopyConverter::default()),
            Arc::new(StubInspector),
            options(),
        );
        let err = preparer
            .prepare(&dir.path().join("missing.wav"), &dir.path().join("out.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidInput(_)));
    }
}
