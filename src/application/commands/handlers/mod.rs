//! Command Handlers 实现

mod profile_handlers;

pub use profile_handlers::*;
