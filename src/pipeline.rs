//! Filtering followed by optional target-size selection, with progress logging
//!
//! Every front-end goes through this: score each read against the thresholds,
//! keep the ones that pass, then trim to the target number of bases if one is set.

use rayon::prelude::*;

use crate::filter::{evaluate_filters, format_count, FilterConfig};
use crate::select::{select_for_target, Selection, TargetOutcome};
use crate::shared::Read;

/// Reads that passed the filters, in input order
#[derive(Debug, Clone)]
pub struct FilterSummary {
    pub reads: Vec<Read>,
    pub total_bases: u64,
}

/// Keep the reads that pass every threshold in `config`
pub fn filter_reads(reads: Vec<Read>, config: &FilterConfig) -> FilterSummary {
    let lengths: Vec<(bool, usize)> = reads
        .par_iter()
        .map(|read| evaluate_filters(read, config))
        .collect();

    let total_bases = lengths.iter().map(|&(_, len)| len as u64).sum();
    let reads = reads
        .into_iter()
        .zip(lengths)
        .filter_map(|(read, (passes, _))| passes.then_some(read))
        .collect();

    FilterSummary { reads, total_bases }
}

/// Filter the reads, then select for the target size if one is set
pub fn run_selection(reads: Vec<Read>, config: &FilterConfig) -> Selection {
    let available: u64 = reads.iter().map(|r| r.len() as u64).sum();
    log::info!(
        "Found {} reads ({} bp)",
        format_count(reads.len() as u64),
        format_count(available)
    );

    let filters = config.describe();
    if !filters.is_empty() {
        log::info!("Filtering reads based on: {}", filters.join(", "));
    }
    let filtered = filter_reads(reads, config);
    log::info!(
        "{} reads remain after filtering ({} bp)",
        format_count(filtered.reads.len() as u64),
        format_count(filtered.total_bases)
    );

    if let Some(target) = config.active_target_bases() {
        log::info!(
            "Automatically setting a minimum window quality threshold in order to reach a target of {} bp",
            format_count(target)
        );
    }

    let selection = select_for_target(filtered.reads, config);
    match selection.outcome {
        TargetOutcome::NotRequested => {}
        TargetOutcome::Unreachable => {
            log::warn!("Not enough total bases to reach target");
        }
        TargetOutcome::Reached { threshold } => {
            log::info!("Min window quality threshold = {:.2}", threshold);
            log::info!(
                "{} reads remain ({} bp)",
                format_count(selection.reads.len() as u64),
                format_count(selection.total_bases)
            );
        }
    }
    selection
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_by_length() {
        let reads = vec![Read::new(b"a", b"ACGT", b"####"), Read::new(b"b", b"AC", b"##")];
        let config = FilterConfig {
            min_length: Some(3),
            ..Default::default()
        };
        let summary = filter_reads(reads, &config);

        assert_eq!(summary.reads, vec![Read::new(b"a", b"ACGT", b"####")]);
        assert_eq!(summary.total_bases, 4);
    }

    #[test]
    fn test_filter_drops_malformed_reads() {
        let reads = vec![
            Read::new(b"a", b"ACGT", b"IIII"),
            Read::new(b"b", b"ACGT", b"II"),
            Read::new(b"c", b"", b""),
            Read::new(b"d", b"AC", b"II"),
        ];
        let summary = filter_reads(reads, &FilterConfig::default());

        let names: Vec<_> = summary.reads.iter().map(|r| r.name.clone()).collect();
        assert_eq!(names, vec![b"a".to_vec(), b"d".to_vec()]);
        assert_eq!(summary.total_bases, 6);
    }

    #[test]
    fn test_run_selection_filters_then_selects() {
        // "c" fails the length filter even though its quality is the best
        let reads = vec![
            Read::new(b"a", b"ACGTACGT", b"55555555"),
            Read::new(b"b", b"ACGTACGT", b"????????"),
            Read::new(b"c", b"ACG", b"III"),
            Read::new(b"d", b"ACGTACGT", b"++++++++"),
        ];
        let config = FilterConfig {
            min_length: Some(4),
            target_bases: Some(10),
            window_size: 4,
            ..Default::default()
        };
        let selection = run_selection(reads, &config);

        let names: Vec<_> = selection.reads.iter().map(|r| r.name.clone()).collect();
        assert_eq!(names, vec![b"a".to_vec(), b"b".to_vec()]);
        assert_eq!(selection.total_bases, 16);
        assert_eq!(selection.threshold(), Some(20.0));
    }

    #[test]
    fn test_run_selection_without_target() {
        let reads = vec![Read::new(b"a", b"ACGT", b"####"), Read::new(b"b", b"AC", b"##")];
        let config = FilterConfig {
            min_length: Some(3),
            ..Default::default()
        };
        let selection = run_selection(reads, &config);

        assert_eq!(selection.reads.len(), 1);
        assert_eq!(selection.total_bases, 4);
        assert_eq!(selection.outcome, TargetOutcome::NotRequested);
    }
}
