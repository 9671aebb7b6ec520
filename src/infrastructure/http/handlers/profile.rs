//! Profile HTTP Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{DeleteProfile, GetProfile, ListProfiles, ProfileResponse, ProfileSummary};
use crate::infrastructure::http::dto::{ApiResponse, Empty, ProfileIdRequest};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 列出所有档案
pub async fn list_profiles(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ProfileSummary>>>, ApiError> {
    let profiles = state.list_profiles_handler.handle(ListProfiles).await?;
    Ok(Json(ApiResponse::success(profiles)))
}

/// 获取档案详情
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProfileIdRequest>,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    let profile = state
        .get_profile_handler
        .handle(GetProfile { id: req.id })
        .await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// 删除档案
pub async fn delete_profile(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProfileIdRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state
        .delete_profile_handler
        .handle(DeleteProfile { id: req.id })
        .await?;
    Ok(Json(ApiResponse::ok()))
}
