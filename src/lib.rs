pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod registry;
pub mod skills;
pub mod sync;
pub mod utils;

pub use error::{HubError, Result};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
