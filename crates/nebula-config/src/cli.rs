//! Command-line argument parsing for the merger.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;
use crate::config::ImageFormat;

/// Merges the submeshes of a job into one mesh, one material, and one atlas
/// per texture channel.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "nebula-merge", about = "Nebula submesh merger")]
pub struct CliArgs {
    /// Merge job file (RON).
    pub job: PathBuf,

    /// Output directory (defaults to `<job dir>/<name><suffix>`).
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Atlas width in pixels.
    #[arg(long)]
    pub width: Option<u32>,

    /// Atlas height in pixels.
    #[arg(long)]
    pub height: Option<u32>,

    /// Atlas grid columns.
    #[arg(long)]
    pub columns: Option<u32>,

    /// Atlas grid rows.
    #[arg(long)]
    pub rows: Option<u32>,

    /// Atlas image format.
    #[arg(long, value_enum)]
    pub format: Option<ImageFormat>,

    /// Store bounds in the combined mesh.
    #[arg(long)]
    pub recalculate_bounds: Option<bool>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the atlas grid layout and exit without merging.
    #[arg(long)]
    pub preview: bool,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.atlas.width = w;
        }
        if let Some(h) = args.height {
            self.atlas.height = h;
        }
        if let Some(c) = args.columns {
            self.atlas.columns = c;
        }
        if let Some(r) = args.rows {
            self.atlas.rows = r;
        }
        if let Some(format) = args.format {
            self.output.format = format;
        }
        if let Some(bounds) = args.recalculate_bounds {
            self.output.recalculate_bounds = bounds;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
