//! Profile Queries

/// 获取档案详情查询
#[derive(Debug, Clone)]
pub struct GetProfile {
    pub id: String,
}

/// 列出所有档案查询
#[derive(Debug, Clone)]
pub struct ListProfiles;
