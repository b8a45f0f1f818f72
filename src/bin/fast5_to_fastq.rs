//! FAST5 to FASTQ conversion with read selection
//!
//! Every `*.fast5` file under a directory is opened and its best basecall is
//! resolved (2D, else the better strand, else whatever FASTQ it holds). Those reads
//! then go through the same filters and target-size selection as `fastq-select`.
//!
//! Files that fail to open are dropped, so file integrity always acts as a filter.
//! Unlike `fastq-select` this tool also runs with no other filter, as a plain converter.
//!
//! # Examples
//!
//! ```bash
//! fast5-to-fastq run_1/fast5 --min-length 2000 > reads.fastq
//! fast5-to-fastq run_1/fast5 --target-bases 500000000 -o best.fastq
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;

use read_select::cli::{is_broken_pipe, FilterArgs};
use read_select::fast5::{best_read, find_fast5_files};
use read_select::filter::{format_count, FilterConfig};
use read_select::pipeline::run_selection;
use read_select::shared::{get_output, write_fastq, Read};

/// Best basecall of every readable file; unreadable files are logged and skipped
fn load_reads(files: &[PathBuf]) -> Vec<Read> {
    let mut reads = Vec::with_capacity(files.len());
    let mut unreadable = 0u64;
    for path in files {
        match best_read(path) {
            // Files without a basecall stay in as empty reads and fail the filters
            Ok(read) => reads.push(read.unwrap_or_default()),
            Err(e) => {
                log::debug!("Skipping {}: {}", path.display(), e);
                unreadable += 1;
            }
        }
    }
    if unreadable > 0 {
        log::warn!("{} fast5 files could not be read", format_count(unreadable));
    }
    reads
}

/// Convert the FAST5 files under `dir`, writing selected reads as FASTQ
pub fn fast5_to_fastq(dir: &Path, mut output: impl Write, config: &FilterConfig) -> Result<()> {
    log::info!("Looking for fast5 files in: {}", dir.display());
    let files = find_fast5_files(dir)
        .with_context(|| format!("Error searching directory: {}", dir.display()))?;
    log::info!("Found {} reads", format_count(files.len() as u64));
    if files.is_empty() {
        return Ok(());
    }

    let reads = load_reads(&files);
    let selection = run_selection(reads, config);

    log::info!("Printing FASTQs");
    for read in &selection.reads {
        write_fastq(&mut output, read).context("Error writing output")?;
    }
    output.flush().context("Error writing output")
}

/// Extract FASTQ reads from FAST5 files
#[derive(Parser)]
#[command(name = "fast5-to-fastq")]
#[command(version, about = "Extract the best basecall from each FAST5 file as FASTQ, with optional filtering")]
struct Args {
    /// Directory of FAST5 reads to extract (searched recursively)
    dir: PathBuf,

    /// Output FASTQ file (use '-' or omit for stdout)
    #[arg(short, long)]
    output: Option<String>,

    #[command(flatten)]
    filters: FilterArgs,
}

fn run(args: &Args) -> Result<()> {
    let config = args.filters.filter_config();
    let output = get_output(args.output.as_deref()).context("Error opening output")?;
    fast5_to_fastq(&args.dir, output, &config)?;
    log::info!("Done!");
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
