//! Model Manager - 模型生命周期管理
//!
//! 独占持有已加载的模型句柄。其他组件只能通过 `get_model()` 取得句柄。
//!
//! 设备选择在构造时完成一次（配置可强制指定）：
//! 1. 后端报告 CUDA 可用且平台不是 macOS → cuda
//! 2. 平台是 macOS 且后端报告 MPS 可用 → mps
//! 3. 否则 → cpu

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::ports::{
    Device, DeviceCapabilities, DevicePreference, LoadRequest, Precision, SpeechModel,
    TtsBackendPort, TtsError,
};
use crate::config::ModelConfig;

/// Model Manager 配置
#[derive(Debug, Clone)]
pub struct ModelManagerConfig {
    pub model_name: String,
    pub cache_dir: PathBuf,
    pub device: DevicePreference,
    pub precision: Precision,
    pub force_fp32_on_mps: bool,
}

impl From<&ModelConfig> for ModelManagerConfig {
    fn from(config: &ModelConfig) -> Self {
        Self {
            model_name: config.name.clone(),
            cache_dir: config.cache_dir.clone(),
            device: config.device,
            precision: config.precision,
            force_fp32_on_mps: config.force_fp32_on_mps,
        }
    }
}

/// 模型状态
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub loaded: bool,
    pub model_name: String,
    pub device: Device,
    pub precision: Precision,
}

/// 根据后端能力和运行平台选择设备
pub fn select_device(capabilities: DeviceCapabilities, os: &str) -> Device {
    if capabilities.cuda && os != "macos" {
        Device::Cuda
    } else if capabilities.mps && os == "macos" {
        Device::Mps
    } else {
        Device::Cpu
    }
}

/// 根据设备确定实际精度
///
/// CPU 总是 float32；MPS 上部分模型必须 float32
pub fn resolve_precision(device: Device, requested: Precision, force_fp32_on_mps: bool) -> Precision {
    match device {
        Device::Cpu => Precision::Float32,
        Device::Mps if force_fp32_on_mps => Precision::Float32,
        _ => requested,
    }
}

/// Model Manager
pub struct ModelManager {
    config: ModelManagerConfig,
    backend: Arc<dyn TtsBackendPort>,
    device: Device,
    precision: Precision,
    model: Mutex<Option<Arc<dyn SpeechModel>>>,
}

impl ModelManager {
    /// 创建 Model Manager，并确定计算设备和精度
    pub async fn new(config: ModelManagerConfig, backend: Arc<dyn TtsBackendPort>) -> Self {
        let device = match config.device {
            DevicePreference::Auto => {
                let capabilities = match backend.probe_devices().await {
                    Ok(capabilities) => capabilities,
                    Err(e) => {
                        tracing::warn!(error = %e, "Device probe failed, falling back to CPU");
                        DeviceCapabilities::default()
                    }
                };
                select_device(capabilities, std::env::consts::OS)
            }
            DevicePreference::Cuda => Device::Cuda,
            DevicePreference::Mps => Device::Mps,
            DevicePreference::Cpu => Device::Cpu,
        };

        let precision = resolve_precision(device, config.precision, config.force_fp32_on_mps);
        if precision != config.precision {
            tracing::info!(
                device = %device,
                requested = %config.precision,
                effective = %precision,
                "Precision overridden for device"
            );
        }

        tracing::info!(
            model = %config.model_name,
            device = %device,
            precision = %precision,
            "ModelManager initialized"
        );

        Self {
            config,
            backend,
            device,
            precision,
            model: Mutex::new(None),
        }
    }

    /// 加载模型
    ///
    /// 已加载时直接返回 true；失败时句柄保持为空并返回 false
    pub async fn load(&self) -> bool {
        let mut slot = self.model.lock().await;
        if slot.is_some() {
            tracing::debug!(model = %self.config.model_name, "Model already loaded");
            return true;
        }

        tracing::info!(
            model = %self.config.model_name,
            device = %self.device,
            precision = %self.precision,
            "Loading model"
        );

        let request = LoadRequest {
            model_name: self.config.model_name.clone(),
            cache_dir: self.config.cache_dir.clone(),
            device: self.device,
            precision: self.precision,
        };

        match self.backend.from_pretrained(request).await {
            Ok(model) => {
                *slot = Some(model);
                tracing::info!(model = %self.config.model_name, "Model loaded");
                true
            }
            Err(e) => {
                *slot = None;
                match &e {
                    TtsError::OutOfMemory(device) => tracing::error!(
                        model = %self.config.model_name,
                        device = %device,
                        "Model load failed: out of memory, try a smaller model or device=cpu"
                    ),
                    _ => tracing::error!(
                        model = %self.config.model_name,
                        error = %e,
                        "Model load failed"
                    ),
                }
                false
            }
        }
    }

    /// 卸载模型并尽力回收设备内存
    pub async fn unload(&self) {
        let mut slot = self.model.lock().await;
        let Some(model) = slot.take() else {
            tracing::debug!("Unload requested but no model loaded");
            return;
        };
        drop(model);

        if let Err(e) = self
            .backend
            .release(&self.config.model_name, self.device)
            .await
        {
            tracing::warn!(error = %e, device = %self.device, "Device memory reclamation failed");
        }

        tracing::info!(model = %self.config.model_name, "Model unloaded");
    }

    pub async fn is_loaded(&self) -> bool {
        self.model.lock().await.is_some()
    }

    /// 获取已加载的模型句柄
    pub async fn get_model(&self) -> Option<Arc<dyn SpeechModel>> {
        self.model.lock().await.clone()
    }

    pub async fn status(&self) -> ModelStatus {
        ModelStatus {
            loaded: self.is_loaded().await,
            model_name: self.config.model_name.clone(),
            device: self.device,
            precision: self.precision,
        }
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn backend(&self) -> &Arc<dyn TtsBackendPort> {
        &self.backend
    }
}
