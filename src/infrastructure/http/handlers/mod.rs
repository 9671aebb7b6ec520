//! HTTP Handlers

mod audio;
mod generate;
mod model;
mod ping;
mod profile;

pub use audio::*;
pub use generate::*;
pub use model::*;
pub use ping::*;
pub use profile::*;
