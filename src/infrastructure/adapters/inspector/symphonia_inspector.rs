//! Symphonia Inspector - 解码音频文件并统计电平
//!
//! 支持 wav / flac / mp3 / ogg(vorbis) / m4a(aac)

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{AudioInfo, AudioInspectorPort, InspectError};

/// 绝对值达到此值的样本计为削波
const CLIP_LEVEL: f32 = 0.999;

/// 基于 symphonia 的 Audio Inspector
#[derive(Debug, Clone, Default)]
pub struct SymphoniaInspector;

impl SymphoniaInspector {
    pub fn new() -> Self {
        Self
    }
}

/// 解码过程中累积的电平统计
#[derive(Default)]
struct LevelStats {
    frames: u64,
    values: u64,
    peak: f32,
    sum_squares: f64,
    clipped: u64,
}

impl LevelStats {
    fn add(&mut self, samples: &[f32], channels: usize) {
        for &s in samples {
            let a = s.abs();
            if a > self.peak {
                self.peak = a;
            }
            if a >= CLIP_LEVEL {
                self.clipped += 1;
            }
            self.sum_squares += (s as f64) * (s as f64);
        }
        self.values += samples.len() as u64;
        self.frames += (samples.len() / channels.max(1)) as u64;
    }

    fn rms(&self) -> f32 {
        if self.values == 0 {
            0.0
        } else {
            (self.sum_squares / self.values as f64).sqrt() as f32
        }
    }

    fn clipped_ratio(&self) -> f32 {
        if self.values == 0 {
            0.0
        } else {
            self.clipped as f32 / self.values as f32
        }
    }
}

impl AudioInspectorPort for SymphoniaInspector {
    fn inspect(&self, path: &Path) -> Result<AudioInfo, InspectError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => InspectError::NotFound(path.display().to_string()),
            _ => InspectError::IoError(e.to_string()),
        })?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| InspectError::DecodingError(format!("Probe failed: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| InspectError::DecodingError("No audio track found".to_string()))?;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| InspectError::DecodingError("Unknown sample rate".to_string()))?;
        let bit_depth = track.codec_params.bits_per_sample.map(|b| b as u16);
        let track_id = track.id;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| InspectError::DecodingError(format!("Decoder creation failed: {}", e)))?;

        let mut stats = LevelStats::default();
        let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(0);

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => {
                    return Err(InspectError::DecodingError(format!(
                        "Packet read error: {}",
                        e
                    )));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(e)) => {
                    tracing::warn!(path = %path.display(), "Decode error (skipping packet): {}", e);
                    continue;
                }
                Err(e) => return Err(InspectError::DecodingError(e.to_string())),
            };

            let spec = *decoded.spec();
            channels = spec.channels.count();
            let num_frames = decoded.frames();
            let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);
            let actual = num_frames * channels;
            stats.add(&sample_buf.samples()[..actual], channels);
        }

        if stats.frames == 0 {
            return Err(InspectError::DecodingError("No audio frames decoded".to_string()));
        }

        Ok(AudioInfo {
            duration_secs: stats.frames as f64 / sample_rate as f64,
            sample_rate,
            channels: channels as u16,
            bit_depth,
            peak: stats.peak,
            rms: stats.rms(),
            clipped_ratio: stats.clipped_ratio(),
        })
    }
}
