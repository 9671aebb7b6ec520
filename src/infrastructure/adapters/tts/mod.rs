//! TTS Adapter - TTS 推理后端实现

mod fake_tts_client;
mod http_tts_client;

pub use fake_tts_client::{FakeTtsBackend, FakeTtsConfig};
pub use http_tts_client::{decode_wav_bytes, HttpSpeechModel, HttpTtsBackend, HttpTtsClientConfig};
