//! sdf-mask: convert a black and white mask image into a signed distance field PNG.
//!
//! Drives the generation tick by tick, the same way a host application would,
//! and reports the progress of every phase on stderr.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --features cli --bin sdf-mask -- [OPTIONS] <INPUT>
//! ```
//!
//! Logging is controlled through `RUST_LOG` and defaults to `info`.

use std::num::NonZeroU32;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::info;

use sequential_distance_field::files::{default_target_path, start_file_run};
use sequential_distance_field::prelude::*;


/// Convert a mask image into a normalized signed distance field.
///
/// Pixels darker than the threshold are inside the shape. The output is a
/// grayscale PNG where 0.5 marks the boundary of the shape.
#[derive(Parser)]
#[command(name = "sdf-mask", version)]
struct Cli {
    /// Path to the mask image (PNG, JPEG, BMP).
    input: PathBuf,

    /// Where to write the distance field. Defaults to `<input>_distance.png`.
    /// A missing file is created.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON file with generator settings. Flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Luminance below which a pixel is inside the shape (0.0-1.0).
    #[arg(long)]
    threshold: Option<f32>,

    /// Pixel distance spanning the whole output range.
    #[arg(long)]
    spread: Option<f32>,

    /// Keep values outside 0.0-1.0 until they are quantized.
    #[arg(long)]
    no_clamp: bool,

    /// Rows processed per tick in the per-pixel phases.
    #[arg(long)]
    chunk_rows: Option<NonZeroU32>,

    /// Store the composited field with 16 bit floats.
    #[arg(long)]
    half_precision: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(RunStatus::Completed) => ExitCode::SUCCESS,
        Ok(status) => {
            eprintln!("error: run ended as {:?}", status);
            ExitCode::FAILURE
        }
        Err(error) => {
            eprintln!("error: {}", error);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<RunStatus, PipelineError> {
    let config = load_config(cli)?;

    let output = cli.output.clone().unwrap_or_else(|| default_target_path(&cli.input));

    if cli.half_precision {
        drive(start_file_run::<F16DistanceStorage>(&cli.input, output, config)?)
    }
    else {
        drive(start_file_run::<F32DistanceStorage>(&cli.input, output, config)?)
    }
}

fn load_config(cli: &Cli) -> Result<GeneratorConfig, PipelineError> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|error| PipelineError::InvalidConfig(format!("{}: {}", path.display(), error)))?;
            GeneratorConfig::from_json(&json)?
        }
        None => GeneratorConfig::default(),
    };

    if let Some(threshold) = cli.threshold { config.threshold = threshold; }
    if let Some(spread) = cli.spread { config.spread = spread; }
    if cli.no_clamp { config.clamp = false; }
    if cli.chunk_rows.is_some() { config.chunk_rows = cli.chunk_rows; }

    config.validate()?;
    Ok(config)
}

fn drive<D: DistanceStorage>(mut run: PipelineRun<FileSource, FileTarget, D>) -> Result<RunStatus, PipelineError> {
    let mut last_phase = None;

    let mut observer = |progress: &Progress| {
        if last_phase != Some(progress.phase) {
            eprintln!("{:>3.0}% {}", progress.fraction() * 100.0, progress.phase);
            last_phase = Some(progress.phase);
        }

        Control::Continue
    };

    let status = run.run_to_end(&mut observer)?;
    if status == RunStatus::Completed {
        if let Some(target) = run.target() {
            info!("wrote {}", target.path().display());
        }
    }

    Ok(status)
}
