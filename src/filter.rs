//! Per-read filtering on length, mean quality and windowed quality

use crate::quality::{mean_quality, min_window_quality, DEFAULT_WINDOW_SIZE};
use crate::shared::Read;

/// Thresholds applied to every read
///
/// Unset and zero thresholds are both treated as "not applied".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterConfig {
    pub min_length: Option<usize>,
    pub min_mean_quality: Option<f64>,
    pub min_window_quality: Option<f64>,
    pub window_size: usize,
    pub target_bases: Option<u64>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_length: None,
            min_mean_quality: None,
            min_window_quality: None,
            window_size: DEFAULT_WINDOW_SIZE,
            target_bases: None,
        }
    }
}

impl FilterConfig {
    fn active_min_length(&self) -> Option<usize> {
        self.min_length.filter(|&l| l > 0)
    }

    fn active_min_mean_quality(&self) -> Option<f64> {
        self.min_mean_quality.filter(|&q| q != 0.0)
    }

    fn active_min_window_quality(&self) -> Option<f64> {
        self.min_window_quality.filter(|&q| q != 0.0)
    }

    /// Target bases, if set to something other than zero
    pub fn active_target_bases(&self) -> Option<u64> {
        self.target_bases.filter(|&t| t > 0)
    }

    /// True when no threshold is active and no target was given at all
    ///
    /// A target of zero still counts as given even though it trims nothing.
    pub fn is_empty(&self) -> bool {
        self.active_min_length().is_none()
            && self.active_min_mean_quality().is_none()
            && self.active_min_window_quality().is_none()
            && self.target_bases.is_none()
    }

    /// Human-readable description of each per-read threshold in use
    pub fn describe(&self) -> Vec<String> {
        let mut filters = Vec::new();
        if let Some(min_length) = self.active_min_length() {
            filters.push(format!("length >= {} bp", format_count(min_length as u64)));
        }
        if let Some(min_mean) = self.active_min_mean_quality() {
            filters.push(format!("mean quality >= {}", min_mean));
        }
        if let Some(min_window) = self.active_min_window_quality() {
            filters.push(format!("min window quality >= {}", min_window));
        }
        filters
    }
}

/// Why a read was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Empty sequence, empty quality, or lengths that differ
    Malformed,
    MeanQuality,
    Length,
    WindowQuality,
}

/// Check one read against the thresholds
///
/// Rules run in a fixed order and the first failure wins.
pub fn check_read(read: &Read, config: &FilterConfig) -> Result<usize, Rejection> {
    if !read.is_well_formed() {
        return Err(Rejection::Malformed);
    }
    if let Some(min_mean) = config.active_min_mean_quality() {
        if mean_quality(&read.quality) < min_mean {
            return Err(Rejection::MeanQuality);
        }
    }
    if let Some(min_length) = config.active_min_length() {
        if read.len() < min_length {
            return Err(Rejection::Length);
        }
    }
    if let Some(min_window) = config.active_min_window_quality() {
        if min_window_quality(&read.quality, config.window_size) < min_window {
            return Err(Rejection::WindowQuality);
        }
    }
    Ok(read.len())
}

/// Pass/fail plus the read length, which is 0 whenever the read fails
pub fn evaluate_filters(read: &Read, config: &FilterConfig) -> (bool, usize) {
    match check_read(read, config) {
        Ok(length) => (true, length),
        Err(reason) => {
            log::trace!(
                "{} rejected: {:?}",
                String::from_utf8_lossy(&read.name),
                reason
            );
            (false, 0)
        }
    }
}

/// Format a count with thousands separators
pub fn format_count(num: u64) -> String {
    let digits = num.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
