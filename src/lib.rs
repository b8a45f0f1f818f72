//! Quality-based selection of basecalled sequencing reads
//!
//! Reads are filtered on length, mean quality and minimum windowed quality. When a
//! target number of bases is given, the best reads by windowed quality are kept until
//! the target is passed.

pub mod basecall;
pub mod cli;
pub mod fast5;
pub mod filter;
pub mod pipeline;
pub mod quality;
pub mod select;
pub mod shared;

pub use basecall::{resolve_basecall, BasecallCandidate, VariantKind};
pub use filter::{evaluate_filters, FilterConfig};
pub use select::{select_for_target, Selection, SelectionKey, TargetOutcome};
pub use shared::Read;
