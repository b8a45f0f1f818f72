//! Keeping the best reads up to a target number of bases
//!
//! Reads are ranked by their minimum windowed quality, then by length, then by name,
//! all descending. Reads are taken in that order until the running total of bases
//! first exceeds the target. The kept set therefore overshoots the target by up to
//! one read, and the reported threshold is the windowed quality of the last read
//! taken. Another read with that same score may still be left out if it ranks
//! lower on length or name.

use std::cmp::Ordering;

use rayon::prelude::*;

use crate::filter::FilterConfig;
use crate::quality::min_window_quality;
use crate::shared::Read;

/// Ranking tuple for one read
#[derive(Debug, Clone)]
pub struct SelectionKey<'a> {
    pub min_window_score: f64,
    pub length: usize,
    pub identifier: &'a [u8],
}

impl<'a> SelectionKey<'a> {
    pub fn new(read: &'a Read, window_size: usize) -> Self {
        Self {
            min_window_score: min_window_quality(&read.quality, window_size),
            length: read.len(),
            identifier: &read.name,
        }
    }
}

impl Ord for SelectionKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.min_window_score
            .total_cmp(&other.min_window_score)
            .then(self.length.cmp(&other.length))
            .then_with(|| self.identifier.cmp(other.identifier))
    }
}

impl PartialOrd for SelectionKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SelectionKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SelectionKey<'_> {}

/// How the target-size step ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetOutcome {
    /// No target was set, nothing was trimmed
    NotRequested,
    /// Fewer bases were available than the target, nothing was trimmed
    Unreachable,
    /// Reads were trimmed; the windowed quality of the last read kept
    Reached { threshold: f64 },
}

/// Reads left after target-size selection, in their original order
#[derive(Debug, Clone)]
pub struct Selection {
    pub reads: Vec<Read>,
    pub total_bases: u64,
    pub outcome: TargetOutcome,
}

impl Selection {
    /// Threshold reported for the cut, if one was made
    pub fn threshold(&self) -> Option<f64> {
        match self.outcome {
            TargetOutcome::Reached { threshold } => Some(threshold),
            _ => None,
        }
    }
}

fn total_bases(reads: &[Read]) -> u64 {
    reads.iter().map(|r| r.len() as u64).sum()
}

/// Trim already-filtered reads down to the target number of bases
pub fn select_for_target(reads: Vec<Read>, config: &FilterConfig) -> Selection {
    let available = total_bases(&reads);

    let Some(target) = config.active_target_bases() else {
        return Selection {
            reads,
            total_bases: available,
            outcome: TargetOutcome::NotRequested,
        };
    };

    if available < target {
        return Selection {
            reads,
            total_bases: available,
            outcome: TargetOutcome::Unreachable,
        };
    }

    let mut ranked: Vec<(usize, SelectionKey)> = reads
        .par_iter()
        .enumerate()
        .map(|(i, read)| (i, SelectionKey::new(read, config.window_size)))
        .collect();
    // Best first
    ranked.sort_unstable_by(|(_, a), (_, b)| b.cmp(a));

    let mut keep = vec![false; reads.len()];
    let mut kept_bases = 0u64;
    let mut threshold = 0.0;
    for (i, key) in &ranked {
        kept_bases += key.length as u64;
        threshold = key.min_window_score;
        keep[*i] = true;
        if kept_bases > target {
            break;
        }
    }

    let reads = reads
        .into_iter()
        .zip(keep)
        .filter_map(|(read, kept)| kept.then_some(read))
        .collect();

    Selection {
        reads,
        total_bases: kept_bases,
        outcome: TargetOutcome::Reached { threshold },
    }
}
