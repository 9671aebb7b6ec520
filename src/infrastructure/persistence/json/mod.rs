//! JSON 文件存储
//!
//! 每个档案一个 `<id>.json` 文档

mod profile_repo;

pub use profile_repo::JsonProfileRepository;
