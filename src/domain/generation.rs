//! 生成模式
//!
//! 目前只实现了声音克隆；其余两个模式仅保留标签，调用时返回明确的
//! "unsupported mode" 错误。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 生成模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// 使用参考音频克隆声音
    #[default]
    Clone,
    /// 预置音色（保留）
    CustomVoice,
    /// 文本描述设计音色（保留）
    VoiceDesign,
}

impl GenerationMode {
    pub fn is_supported(&self) -> bool {
        matches!(self, GenerationMode::Clone)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Clone => "clone",
            GenerationMode::CustomVoice => "custom_voice",
            GenerationMode::VoiceDesign => "voice_design",
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "clone" => Ok(GenerationMode::Clone),
            "custom" | "custom_voice" => Ok(GenerationMode::CustomVoice),
            "design" | "voice_design" => Ok(GenerationMode::VoiceDesign),
            other => Err(format!("unknown generation mode: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_clone_supported() {
        assert!(GenerationMode::Clone.is_supported());
        assert!(!GenerationMode::CustomVoice.is_supported());
        assert!(!GenerationMode::VoiceDesign.is_supported());
    }

    #[test]
    fn test_parse() {
        assert_eq!("clone".parse::<GenerationMode>().unwrap(), GenerationMode::Clone);
        assert_eq!("custom-voice".parse::<GenerationMode>().unwrap(), GenerationMode::CustomVoice);
        assert_eq!("design".parse::<GenerationMode>().unwrap(), GenerationMode::VoiceDesign);
        assert!("sing".parse::<GenerationMode>().is_err());
    }
}
