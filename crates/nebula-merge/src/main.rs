//! The binary entry point for the submesh merger.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use nebula_config::{CliArgs, Config, default_config_dir};
use nebula_grid::GridLayout;
use nebula_merge::{JobError, MergeJob, render_preview, run, write_outputs};

fn main() -> ExitCode {
    let args = CliArgs::parse();
    match merge_job(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "merge failed");
            eprintln!("nebula-merge: {e}");
            ExitCode::FAILURE
        }
    }
}

fn merge_job(args: &CliArgs) -> Result<(), JobError> {
    let config_dir = match &args.config {
        Some(dir) => dir.clone(),
        None => default_config_dir()?,
    };
    let config_path = Config::file_path(&config_dir);
    let created = !config_path.exists();
    let mut config = Config::load_or_create(&config_dir)?;
    config.apply_cli_overrides(args);
    nebula_log::init_logging(Some(&config_dir.join("logs")), Some(&config));
    tracing::info!(path = %config_path.display(), created, "using config");

    let job = MergeJob::load(&args.job)?;
    let job_dir = args.job.parent().unwrap_or(Path::new("."));
    tracing::info!(job = %args.job.display(), name = job.name.as_str(), "loaded merge job");

    if args.preview {
        let grid = GridLayout::new(config.atlas.columns, config.atlas.rows)?;
        for (channel, bindings) in job.channel_bindings(&job.submesh_order()) {
            println!("{channel}");
            print!("{}", render_preview(&grid, &bindings));
        }
        return Ok(());
    }

    let outputs = run(&job, job_dir, &config)?;

    let base_name = format!("{}{}", job.name, config.output.suffix);
    let out_dir = args
        .out
        .clone()
        .unwrap_or_else(|| job_dir.join(&base_name));
    let written = write_outputs(&outputs, &out_dir, &base_name, &config.output)?;

    println!("mesh:     {}", written.mesh.display());
    println!("material: {}", written.material.display());
    for path in written.atlases.values() {
        println!("atlas:    {}", path.display());
    }
    Ok(())
}
