//! Application State
//!
//! HTTP 层共享的服务和 Command/Query Handlers

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::{
    BatchProcessor, DeleteProfileHandler, GetProfileHandler, ListProfilesHandler, ModelManager,
    ProfileRepositoryPort, VoiceGenerator,
};

/// 应用状态
pub struct AppState {
    // ========== Services ==========
    pub model_manager: Arc<ModelManager>,
    pub generator: Arc<VoiceGenerator>,
    pub batch_processor: BatchProcessor,

    // ========== Command Handlers ==========
    pub delete_profile_handler: DeleteProfileHandler,

    // ========== Query Handlers ==========
    pub get_profile_handler: GetProfileHandler,
    pub list_profiles_handler: ListProfilesHandler,

    /// 生成音频输出目录（/api/audio 只允许访问此目录）
    pub output_dir: PathBuf,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        profile_repo: Arc<dyn ProfileRepositoryPort>,
        model_manager: Arc<ModelManager>,
        generator: Arc<VoiceGenerator>,
        samples_dir: PathBuf,
        output_dir: PathBuf,
        unique_output_names: bool,
    ) -> Self {
        Self {
            model_manager,
            batch_processor: BatchProcessor::new(generator.clone(), unique_output_names),
            generator,

            delete_profile_handler: DeleteProfileHandler::new(profile_repo.clone(), samples_dir),

            get_profile_handler: GetProfileHandler::new(profile_repo.clone()),
            list_profiles_handler: ListProfilesHandler::new(profile_repo),

            output_dir,
        }
    }
}
