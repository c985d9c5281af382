//! Configuration for the submesh merger.
//!
//! Settings persist to disk as RON, accept CLI overrides via clap, and
//! tolerate missing or unknown fields so old config files keep loading.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    AtlasSettings, Config, DebugConfig, ImageFormat, OutputConfig, ResampleFilter,
    default_config_dir,
};
pub use error::ConfigError;
