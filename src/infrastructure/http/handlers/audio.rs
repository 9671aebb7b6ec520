//! Audio Download Handler

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use std::path::{Component, PathBuf};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 只接受输出目录内的相对路径
fn resolve(output_dir: &std::path::Path, file_path: &str) -> Option<PathBuf> {
    let relative = std::path::Path::new(file_path.trim_start_matches('/'));
    let mut components = relative.components().peekable();
    components.peek()?;
    if !components.all(|c| matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(output_dir.join(relative))
}

/// 下载生成的音频
pub async fn download_audio(
    State(state): State<Arc<AppState>>,
    Path(file_path): Path<String>,
) -> Result<Response, ApiError> {
    let path = resolve(&state.output_dir, &file_path)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid audio path: {}", file_path)))?;

    if !path.is_file() {
        return Err(ApiError::NotFound(format!("Audio not found: {}", file_path)));
    }

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to open audio file: {}", e)))?;
    let file_size = file
        .metadata()
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to get file metadata: {}", e)))?
        .len();

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio.wav".to_string());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "audio/wav")
        .header(header::CONTENT_LENGTH, file_size)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        )
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
