//! Quality score decoding and windowed quality statistics
//!
//! Scores are Phred+33: each quality symbol decodes to its ASCII value minus 33.
//! No range checking is done, so symbols below `!` decode to negative scores.

/// Offset of the Phred+33 encoding
pub const PHRED_OFFSET: i32 = 33;

/// Window size used when none is given
pub const DEFAULT_WINDOW_SIZE: usize = 50;

/// Convert one ASCII quality symbol to its score (Phred+33 encoding)
#[inline]
pub fn decode_score(symbol: u8) -> i32 {
    i32::from(symbol) - PHRED_OFFSET
}

/// Mean score over the whole quality string, or 0.0 when it is empty
pub fn mean_quality(quality: &[u8]) -> f64 {
    if quality.is_empty() {
        return 0.0;
    }
    let sum: i64 = quality.iter().map(|&q| i64::from(decode_score(q))).sum();
    sum as f64 / quality.len() as f64
}

/// Minimum mean score over every window of `window_size` consecutive symbols
///
/// The first window is averaged directly, then the window slides one position at a
/// time and the running mean is updated from the symbols leaving and entering it.
/// Strings no longer than the window yield their overall mean. An empty string yields 0.0.
/// A `window_size` of zero is treated as one.
pub fn min_window_quality(quality: &[u8], window_size: usize) -> f64 {
    let window_size = window_size.max(1);
    let first_window = &quality[..window_size.min(quality.len())];
    let mut current = mean_quality(first_window);

    if quality.len() <= window_size {
        return current;
    }

    let mut min = current;
    for (leaving, entering) in quality.iter().zip(&quality[window_size..]) {
        current += f64::from(decode_score(*entering) - decode_score(*leaving)) / window_size as f64;
        if current < min {
            min = current;
        }
    }
    min
}
