//! Generation HTTP Handlers

use axum::{extract::State, Json};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;

use crate::application::{ApplicationError, GetProfile};
use crate::domain::{output_filename_for, parse_script, GenerationMode};
use crate::infrastructure::http::dto::{
    ApiResponse, BatchRequest, BatchResponse, GenerateRequest, GenerateResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

fn timestamp() -> String {
    Utc::now().format("%Y%m%d_%H%M%S_%3f").to_string()
}

/// 输出文件名：用户给定的名称清洗后使用，否则按档案和时间生成
fn output_name(requested: Option<&str>, profile_id: &str) -> String {
    match requested.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => {
            let stem = Path::new(name)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| name.to_string());
            output_filename_for(&stem)
        }
        None => format!("{}_{}.wav", profile_id, timestamp()),
    }
}

/// 生成单个音频
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<ApiResponse<GenerateResponse>>, ApiError> {
    let mode = match req.mode.as_deref() {
        Some(mode) => mode.parse::<GenerationMode>().map_err(ApiError::BadRequest)?,
        None => GenerationMode::default(),
    };

    let profile = state
        .get_profile_handler
        .load(GetProfile {
            id: req.profile_id,
        })
        .await?;

    let file = output_name(req.output_name.as_deref(), profile.id().as_str());
    let output_path = state.output_dir.join(&file);

    let outcome = state
        .generator
        .try_generate(mode, &req.text, &profile, &output_path)
        .await
        .map_err(ApplicationError::from)?;

    Ok(Json(ApiResponse::success(GenerateResponse::new(file, &outcome))))
}

/// 按脚本批量生成
pub async fn batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<ApiResponse<BatchResponse>>, ApiError> {
    let segments = parse_script(&req.script);
    if segments.is_empty() {
        return Err(ApiError::BadRequest(
            "Script contains no [MARKER] segments with text".to_string(),
        ));
    }

    let profile = state
        .get_profile_handler
        .load(GetProfile {
            id: req.profile_id,
        })
        .await?;

    let batch_dir = format!("batch_{}", timestamp());
    let report = state
        .batch_processor
        .process(&segments, &profile, &state.output_dir.join(&batch_dir))
        .await;

    let files = report
        .produced
        .iter()
        .filter_map(|p| p.path.file_name())
        .map(|name| format!("{}/{}", batch_dir, name.to_string_lossy()))
        .collect();

    Ok(Json(ApiResponse::success(BatchResponse {
        batch_dir,
        files,
        report,
    })))
}
