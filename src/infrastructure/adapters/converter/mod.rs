//! Audio Converter Adapter - ffmpeg 子进程

mod ffmpeg_converter;

pub use ffmpeg_converter::FfmpegConverter;
