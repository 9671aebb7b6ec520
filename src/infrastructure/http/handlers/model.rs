//! Model HTTP Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::ModelStatus;
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 模型状态
pub async fn model_status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<ModelStatus>> {
    Json(ApiResponse::success(state.model_manager.status().await))
}

/// 加载模型（已加载时直接返回）
pub async fn load_model(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ModelStatus>>, ApiError> {
    if !state.model_manager.load().await {
        return Err(ApiError::ServiceUnavailable(
            "Model load failed, see server log for details".to_string(),
        ));
    }
    Ok(Json(ApiResponse::success(state.model_manager.status().await)))
}

/// 卸载模型
pub async fn unload_model(State(state): State<Arc<AppState>>) -> Json<ApiResponse<ModelStatus>> {
    state.model_manager.unload().await;
    Json(ApiResponse::success(state.model_manager.status().await))
}
