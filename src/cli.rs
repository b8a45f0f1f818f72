//! Command-line pieces shared by the front-end binaries

use std::io;

use clap::builder::RangedU64ValueParser;
use clap::Args;

use crate::filter::FilterConfig;
use crate::quality::DEFAULT_WINDOW_SIZE;

/// Read filtering and target-size options
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Exclude reads shorter than this length (in bp)
    #[arg(long)]
    pub min_length: Option<usize>,

    /// Exclude reads with a mean qscore less than this value
    #[arg(long)]
    pub min_mean_qual: Option<f64>,

    /// Exclude reads where their mean qscore in a sliding window drops below this value
    #[arg(long)]
    pub min_qual_window: Option<f64>,

    /// The size of the sliding window used for --min-qual-window and --target-bases
    #[arg(long, default_value_t = DEFAULT_WINDOW_SIZE, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub window_size: usize,

    /// Exclude the worst reads (by minimum windowed qscore) so that only this many bases remain
    #[arg(long)]
    pub target_bases: Option<u64>,
}

impl FilterArgs {
    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            min_length: self.min_length,
            min_mean_quality: self.min_mean_qual,
            min_window_quality: self.min_qual_window,
            window_size: self.window_size,
            target_bases: self.target_bases,
        }
    }
}

/// True when the error chain ends in a closed pipe, e.g. output piped into `head`
pub fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.root_cause()
        .downcast_ref::<io::Error>()
        .map(|io_err| io_err.kind() == io::ErrorKind::BrokenPipe)
        .unwrap_or(false)
}
