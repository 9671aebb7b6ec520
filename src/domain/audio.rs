//! 音频缓冲
//!
//! 模型逐块返回的单声道 f32 PCM，以及块之间的拼接

use serde::{Deserialize, Serialize};

/// 单声道 PCM 音频缓冲
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioBuffer {
    /// 样本值，范围 [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// 采样率
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// 时长（秒）
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// 按顺序拼接多个块的样本
///
/// 直接首尾相接：不做交叉淡化，也不裁剪接缝处的静音。
/// - 0 个块 → 空缓冲
/// - 1 个块 → 原样返回
pub fn concatenate(chunks: Vec<Vec<f32>>) -> Vec<f32> {
    match chunks.len() {
        0 => Vec::new(),
        1 => chunks.into_iter().next().unwrap_or_default(),
        _ => {
            let total: usize = chunks.iter().map(Vec::len).sum();
            let mut joined = Vec::with_capacity(total);
            for chunk in chunks {
                joined.extend(chunk);
            }
            joined
        }
    }
}
