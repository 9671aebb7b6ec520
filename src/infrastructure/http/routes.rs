//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping               GET   存活检查
//! - /api/profile/list       GET   列出所有档案
//! - /api/profile/get        POST  获取档案详情
//! - /api/profile/delete     POST  删除档案
//! - /api/model/status       GET   模型状态
//! - /api/model/load         POST  加载模型
//! - /api/model/unload       POST  卸载模型
//! - /api/generate           POST  生成单个音频
//! - /api/batch              POST  按脚本批量生成
//! - /api/audio/*file_path   GET   下载生成的音频

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/profile", profile_routes())
        .nest("/model", model_routes())
        .route("/generate", post(handlers::generate))
        .route("/batch", post(handlers::batch))
        .route("/audio/*file_path", get(handlers::download_audio))
}

/// Profile 路由
fn profile_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/list", get(handlers::list_profiles))
        .route("/get", post(handlers::get_profile))
        .route("/delete", post(handlers::delete_profile))
}

/// Model 路由
fn model_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(handlers::model_status))
        .route("/load", post(handlers::load_model))
        .route("/unload", post(handlers::unload_model))
}
