//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::application::{BatchReport, GenerationOutcome};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self::success(Empty {})
    }
}

// ============================================================================
// Profile DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ProfileIdRequest {
    pub id: String,
}

// ============================================================================
// Generation DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub profile_id: String,
    pub text: String,
    /// clone / custom_voice / voice_design，默认 clone
    #[serde(default)]
    pub mode: Option<String>,
    /// 输出文件名（不含目录），默认按档案和时间生成
    #[serde(default)]
    pub output_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    /// 相对于输出目录的路径，用于 /api/audio 下载
    pub file: String,
    pub chunk_count: usize,
    pub sample_count: usize,
    pub duration_secs: f64,
}

impl GenerateResponse {
    pub fn new(file: String, outcome: &GenerationOutcome) -> Self {
        Self {
            file,
            chunk_count: outcome.chunk_count,
            sample_count: outcome.sample_count,
            duration_secs: outcome.duration_secs,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub profile_id: String,
    /// 带 `[MARKER]` 分段的脚本
    pub script: String,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    /// 本次批量输出所在的子目录
    pub batch_dir: String,
    /// 生成成功的文件（相对于输出目录）
    pub files: Vec<String>,
    pub report: BatchReport,
}
