//! FAST5 integrity check
//!
//! Opens every `*.fast5` file under a directory and lists its contents. Files that
//! fail are printed to stdout, one path per line, so the output can be fed to `xargs rm`.
//! Counts of good and bad files are logged at the end.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;

use read_select::cli::is_broken_pipe;
use read_select::fast5::{check_file, find_fast5_files};
use read_select::filter::format_count;
use read_select::shared::get_output;

/// Good and bad file counts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IntegrityReport {
    pub good: u64,
    pub bad: u64,
}

fn plural(count: u64) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Check each file with `check`, writing the path of every failure to `output`
pub fn check_files<E: std::fmt::Display>(
    files: &[PathBuf],
    mut check: impl FnMut(&Path) -> Result<usize, E>,
    mut output: impl Write,
) -> Result<IntegrityReport> {
    let mut report = IntegrityReport::default();
    for path in files {
        match check(path) {
            Ok(objects) => {
                log::trace!("{}: {} objects", path.display(), objects);
                report.good += 1;
                if report.good % 100 == 0 {
                    log::debug!("{} good files so far", format_count(report.good));
                }
            }
            Err(e) => {
                log::debug!("{}: {}", path.display(), e);
                report.bad += 1;
                writeln!(output, "{}", path.display()).context("Error writing output")?;
            }
        }
    }
    output.flush().context("Error writing output")?;
    Ok(report)
}

/// Check FAST5 file integrity (prints bad fast5 files to stdout)
#[derive(Parser)]
#[command(name = "fast5-integrity-check")]
#[command(version, about = "Check FAST5 file integrity (prints bad fast5 files to stdout)")]
struct Args {
    /// Directory of FAST5 reads to check (searched recursively)
    dir: PathBuf,
}

fn run(args: &Args) -> Result<()> {
    log::info!("Looking for fast5 files in: {}", args.dir.display());
    let files = find_fast5_files(&args.dir)
        .with_context(|| format!("Error searching directory: {}", args.dir.display()))?;
    log::info!("Found {} reads", format_count(files.len() as u64));
    if files.is_empty() {
        return Ok(());
    }

    log::info!("Checking file integrity");
    let output = get_output(None).context("Error opening output")?;
    let report = check_files(&files, check_file, output)?;

    log::info!("{} good fast5 file{}", format_count(report.good), plural(report.good));
    log::info!("{} bad fast5 file{}", format_count(report.bad), plural(report.bad));
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        if is_broken_pipe(&e) {
            process::exit(0);
        }
        log::error!("{:#}", e);
        process::exit(1);
    }
}
