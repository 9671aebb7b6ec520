//! FFmpeg Converter - 通过 ffmpeg 子进程处理音频
//!
//! 实现 AudioConverterPort：格式转换、淡入淡出、静音裁剪、响度归一化

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::application::ports::{AudioConverterPort, ConvertError, ConvertOptions};

/// 错误信息保留的 stderr 尾部长度
const STDERR_TAIL: usize = 800;

/// 静音判定阈值
const SILENCE_THRESHOLD: &str = "-50dB";

/// FFmpeg Converter
#[derive(Debug, Clone)]
pub struct FfmpegConverter {
    binary: String,
}

impl FfmpegConverter {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn map_spawn_error(&self, e: std::io::Error) -> ConvertError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConvertError::BinaryNotFound(self.binary.clone())
        } else {
            ConvertError::IoError(e.to_string())
        }
    }

    /// 运行 ffmpeg，覆盖已有输出
    async fn run(&self, input: &Path, output: &Path, args: Vec<OsString>) -> Result<(), ConvertError> {
        if !input.is_file() {
            return Err(ConvertError::InvalidInput(format!(
                "File not found: {}",
                input.display()
            )));
        }

        let mut command = Command::new(&self.binary);
        command
            .args(["-hide_banner", "-loglevel", "error", "-nostdin", "-y", "-i"])
            .arg(input)
            .args(&args)
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        tracing::debug!(
            binary = %self.binary,
            input = %input.display(),
            output = %output.display(),
            args = ?args,
            "Running ffmpeg"
        );

        let result = command.output().await.map_err(|e| self.map_spawn_error(e))?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ConvertError::Failed {
                status: result.status.to_string(),
                stderr: stderr_tail(&stderr),
            });
        }
        Ok(())
    }
}

fn stderr_tail(stderr: &str) -> String {
    let trimmed = stderr.trim();
    let count = trimmed.chars().count();
    if count <= STDERR_TAIL {
        trimmed.to_string()
    } else {
        trimmed.chars().skip(count - STDERR_TAIL).collect()
    }
}

/// PCM 编码器名
fn pcm_codec(bit_depth: u16) -> Result<&'static str, ConvertError> {
    match bit_depth {
        16 => Ok("pcm_s16le"),
        24 => Ok("pcm_s24le"),
        32 => Ok("pcm_f32le"),
        other => Err(ConvertError::InvalidInput(format!(
            "Unsupported bit depth: {}",
            other
        ))),
    }
}

fn convert_args(options: &ConvertOptions) -> Result<Vec<OsString>, ConvertError> {
    let mut args: Vec<OsString> = vec!["-vn".into()];
    if let Some(rate) = options.sample_rate {
        args.push("-ar".into());
        args.push(rate.to_string().into());
    }
    if let Some(channels) = options.channels {
        args.push("-ac".into());
        args.push(channels.to_string().into());
    }
    if let Some(bits) = options.bit_depth {
        args.push("-c:a".into());
        args.push(pcm_codec(bits)?.into());
    }
    Ok(args)
}

fn fade_filter(fade_ms: u32, duration_secs: f64) -> String {
    let fade = (fade_ms as f64 / 1000.0).min(duration_secs / 2.0).max(0.0);
    let out_start = (duration_secs - fade).max(0.0);
    format!(
        "afade=t=in:st=0:d={:.3},afade=t=out:st={:.3}:d={:.3}",
        fade, out_start, fade
    )
}

fn trim_filter() -> String {
    let remove = format!(
        "silenceremove=start_periods=1:start_duration=0.05:start_threshold={}",
        SILENCE_THRESHOLD
    );
    format!("{r},areverse,{r},areverse", r = remove)
}

fn loudnorm_filter(target_lufs: f32) -> String {
    format!("loudnorm=I={:.1}:TP=-1.5:LRA=11", target_lufs)
}

fn filter_args(filter: String) -> Vec<OsString> {
    vec!["-af".into(), filter.into()]
}

#[async_trait]
impl AudioConverterPort for FfmpegConverter {
    async fn ensure_available(&self) -> Result<String, ConvertError> {
        let output = Command::new(&self.binary)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.map_spawn_error(e))?;

        if !output.status.success() {
            return Err(ConvertError::Failed {
                status: output.status.to_string(),
                stderr: stderr_tail(&String::from_utf8_lossy(&output.stderr)),
            });
        }

        let version = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();
        tracing::debug!(binary = %self.binary, version = %version, "ffmpeg available");
        Ok(version)
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        options: &ConvertOptions,
    ) -> Result<(), ConvertError> {
        self.run(input, output, convert_args(options)?).await
    }

    async fn apply_fades(
        &self,
        input: &Path,
        output: &Path,
        fade_ms: u32,
        duration_secs: f64,
    ) -> Result<(), ConvertError> {
        self.run(input, output, filter_args(fade_filter(fade_ms, duration_secs)))
            .await
    }

    async fn trim_silence(&self, input: &Path, output: &Path) -> Result<(), ConvertError> {
        self.run(input, output, filter_args(trim_filter())).await
    }

    async fn normalize_loudness(
        &self,
        input: &Path,
        output: &Path,
        target_lufs: f32,
    ) -> Result<(), ConvertError> {
        self.run(input, output, filter_args(loudnorm_filter(target_lufs)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_convert_args() {
        let args = convert_args(&ConvertOptions {
            sample_rate: Some(24000),
            channels: Some(1),
            bit_depth: Some(16),
        })
        .unwrap();
        let args: Vec<String> = args.into_iter().map(|a| a.into_string().unwrap()).collect();
        assert_eq!(args, vec!["-vn", "-ar", "24000", "-ac", "1", "-c:a", "pcm_s16le"]);

        assert!(convert_args(&ConvertOptions::default()).unwrap().len() == 1);
        assert!(convert_args(&ConvertOptions {
            bit_depth: Some(8),
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_fade_filter_clamped_to_duration() {
        assert_eq!(
            fade_filter(50, 4.0),
            "afade=t=in:st=0:d=0.050,afade=t=out:st=3.950:d=0.050"
        );
        assert_eq!(
            fade_filter(1000, 1.0),
            "afade=t=in:st=0:d=0.500,afade=t=out:st=0.500:d=0.500"
        );
    }

    #[test]
    fn test_filters() {
        assert_eq!(loudnorm_filter(-16.0), "loudnorm=I=-16.0:TP=-1.5:LRA=11");
        assert_eq!(trim_filter().matches("areverse").count(), 2);
    }

    #[test]
    fn test_stderr_tail() {
        let long = "x".repeat(STDERR_TAIL + 100);
        assert_eq!(stderr_tail(&long).len(), STDERR_TAIL);
        assert_eq!(stderr_tail("  short \n"), "short");
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let converter = FfmpegConverter::new("voxclone-no-such-ffmpeg-binary");
        assert!(matches!(
            converter.ensure_available().await,
            Err(ConvertError::BinaryNotFound(_))
        ));

        let dir = tempdir().unwrap();
        let input = dir.path().join("in.wav");
        std::fs::write(&input, b"x").unwrap();
        let err = converter
            .trim_silence(&input, &dir.path().join("out.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::BinaryNotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_input() {
        let dir = tempdir().unwrap();
        let err = FfmpegConverter::new("ffmpeg")
            .convert(
                &dir.path().join("none.wav"),
                &dir.path().join("out.wav"),
                &ConvertOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_convert_with_real_ffmpeg() {
        let converter = FfmpegConverter::new("ffmpeg");
        if converter.ensure_available().await.is_err() {
            return;
        }

        let dir = tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&input, spec).unwrap();
        for i in 0..44100 {
            let v = ((i as f32 / 44100.0) * 440.0 * std::f32::consts::TAU).sin() * 8000.0;
            writer.write_sample(v as i16).unwrap();
            writer.write_sample(v as i16).unwrap();
        }
        writer.finalize().unwrap();

        let output = dir.path().join("out.wav");
        converter
            .convert(
                &input,
                &output,
                &ConvertOptions {
                    sample_rate: Some(24000),
                    channels: Some(1),
                    bit_depth: Some(16),
                },
            )
            .await
            .unwrap();

        let reader = hound::WavReader::open(&output).unwrap();
        assert_eq!(reader.spec().sample_rate, 24000);
        assert_eq!(reader.spec().channels, 1);
    }
}
