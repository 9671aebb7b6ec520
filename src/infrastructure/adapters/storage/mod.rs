//! Audio Storage Adapter - WAV 文件写入

mod wav_storage;

pub use wav_storage::WavFileStorage;
