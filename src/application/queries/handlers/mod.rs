//! Query Handlers 实现

mod profile_handlers;

pub use profile_handlers::*;
pub(crate) use profile_handlers::parse_profile_id;
