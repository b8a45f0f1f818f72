//! FASTQ read selection utility
//!
//! Filter FASTQ reads on length, mean quality and minimum windowed quality, and
//! optionally keep only the best reads up to a target number of bases.
//!
//! **Memory**: O(n) - all reads are loaded so they can be ranked
//! **Streaming**: No - target selection sorts every read that passed the filters
//!
//! # Examples
//!
//! ```bash
//! # Drop short reads and reads with a low-quality stretch
//! fastq-select reads.fastq.gz --min-length 1000 --min-qual-window 7 -o filtered.fastq
//!
//! # Keep the best 500 Mbp by windowed quality
//! fastq-select reads.fastq --target-bases 500000000 > best.fastq
//! ```

use std::io::{self, Write};
use std::process;

use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::Env;

use read_select::cli::{is_broken_pipe, FilterArgs};
use read_select::filter::FilterConfig;
use read_select::pipeline::run_selection;
use read_select::shared::{get_input, get_output, write_fastq, FastqParser};

/// Filter and select FASTQ reads, writing the survivors in input order
pub fn fastq_select(input: &[u8], mut output: impl Write, config: &FilterConfig) -> io::Result<()> {
    let reads: Vec<_> = FastqParser::new(input).collect();
    if reads.is_empty() {
        log::warn!("No reads found in input");
        return output.flush();
    }

    let selection = run_selection(reads, config);

    log::info!("Printing FASTQs");
    for read in &selection.reads {
        write_fastq(&mut output, read)?;
    }
    output.flush()
}

/// Select FASTQ reads by quality and length
#[derive(Parser)]
#[command(name = "fastq-select")]
#[command(version, about = "Filter FASTQ reads by quality and length, or down to a target size")]
#[command(
    long_about = "Filter FASTQ reads on length, mean quality and minimum windowed quality.\nWith --target-bases, the worst reads by windowed quality are also dropped so that only about that many bases remain.\nInput may be gzipped."
)]
struct Args {
    /// Input FASTQ file, optionally gzipped (use '-' or omit for stdin)
    input: Option<String>,

    /// Output FASTQ file (use '-' or omit for stdout)
    #[arg(short, long)]
    output: Option<String>,

    #[command(flatten)]
    filters: FilterArgs,
}

fn run(args: &Args) -> Result<()> {
    let config = args.filters.filter_config();
    if config.is_empty() {
        bail!(
            "no filters were used so this tool refuses to run (because the output FASTQ would be \
             identical to the input FASTQ). Please use one of the following filters: \
             --min-length, --min-mean-qual, --min-qual-window or --target-bases"
        );
    }

    let input_name = args.input.as_deref().unwrap_or("-");
    log::info!("Loading reads from: {}", input_name);
    let input = get_input(args.input.as_deref())
        .with_context(|| format!("Error reading input: {}", input_name))?;
    let output = get_output(args.output.as_deref()).context("Error opening output")?;

    fastq_select(input.as_bytes(), output, &config).context("Error processing FASTQ")?;
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
