//! Profile Commands

use std::path::PathBuf;

/// 创建声音档案命令
#[derive(Debug, Clone)]
pub struct CreateProfile {
    pub name: String,
    pub samples: Vec<PathBuf>,
    pub language: Option<String>,
    pub reference_text: Option<String>,
    pub emotion: Option<String>,
    /// 是否先把样本转换为目标格式
    pub prepare: bool,
}

/// 删除声音档案命令
#[derive(Debug, Clone)]
pub struct DeleteProfile {
    pub id: String,
}
