mod app_stats;
mod error;
mod extractor;
mod ipc;
mod segmenter;

use app_stats::{analyze_apps, print_preview, write_json, OUTPUT_FILE};
use clap::Parser;
use color_eyre::eyre;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// CTA IPC statistics for compressed simulator logs
///
/// Scans DIRECTORY recursively for `*.log.gz` logs, computes kernel, CTA and
/// application IPCs for each and writes them to `data_out.json`.
#[derive(Parser, Debug, Clone)]
#[command(version)]
struct Options {
    /// Directory to scan recursively for compressed logs
    directory: PathBuf,
    /// Cycle count logged at the first sample of every kernel invocation
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    sample_freq: u64,
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let start = Instant::now();
    let options = Options::parse();
    log::debug!("options: {:#?}", &options);

    let stats = analyze_apps(&options.directory, options.sample_freq)?;
    write_json(&stats, Path::new(OUTPUT_FILE))?;
    print_preview(&stats, 10);

    log::info!("done after {:?}", start.elapsed());
    Ok(())
}
