/*!
 * Speaking-rate model.
 *
 * The rate of an entry is the length of one of its text fields divided by
 * its duration in seconds, rounded to two decimals. The deviation is the
 * absolute distance from the target rate, rounded the same way.
 */

use std::fmt;

use crate::errors::SubtitleError;
use crate::subtitle_processor::{SubtitleEntry, SubtitleSet, TextField};

/// Default target speaking rate in characters per second
pub const DEFAULT_TARGET_RATE: f64 = 20.0;

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Characters per second for a text length over a duration.
///
/// Zero or negative durations are outside the model's domain.
pub fn char_rate(char_count: usize, duration_ms: i64) -> Result<f64, SubtitleError> {
    if duration_ms <= 0 {
        return Err(SubtitleError::Domain(format!(
            "Cannot compute a speaking rate over a duration of {} ms",
            duration_ms
        )));
    }
    Ok(round2(char_count as f64 / (duration_ms as f64 / 1000.0)))
}

/// Rate of one entry and its deviation from the target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeakingRate {
    /// Characters per second
    pub char_rate: f64,
    /// Absolute distance from the target rate
    pub char_rate_diff: f64,
}

impl SpeakingRate {
    /// Evaluate an entry's rate over the given text field
    pub fn of(entry: &SubtitleEntry, field: TextField, target_rate: f64) -> Result<Self, SubtitleError> {
        let count = entry.char_count(field).ok_or_else(|| {
            SubtitleError::Precondition(format!(
                "Entry {} has no {}",
                entry.original_index, field
            ))
        })?;
        let char_rate = char_rate(count, entry.duration_ms())?;
        Ok(SpeakingRate {
            char_rate,
            char_rate_diff: round2((char_rate - target_rate).abs()),
        })
    }

    /// Whether the entry speaks faster than the target
    pub fn is_over(&self, target_rate: f64) -> bool {
        self.char_rate > target_rate
    }
}

/// One line of a rate report
#[derive(Debug, Clone, PartialEq)]
pub struct RateReportLine {
    pub index: usize,
    pub timestamp_line: String,
    pub char_count: usize,
    pub rate: SpeakingRate,
}

impl fmt::Display for RateReportLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:>5}  {}  {:>4} chars  {:>7.2} cps  (off by {:.2})",
            self.index, self.timestamp_line, self.char_count, self.rate.char_rate, self.rate.char_rate_diff
        )
    }
}

/// Rates for every entry of a set, in order
pub fn rate_report(set: &SubtitleSet, field: TextField, target_rate: f64) -> Result<Vec<RateReportLine>, SubtitleError> {
    set.iter()
        .map(|entry| {
            let rate = SpeakingRate::of(entry, field, target_rate)?;
            Ok(RateReportLine {
                index: entry.original_index,
                timestamp_line: entry.timestamp_line(),
                char_count: entry.char_count(field).unwrap_or_default(),
                rate,
            })
        })
        .collect()
}

/// Mean rate over all entries, weighted by duration
pub fn average_rate(set: &SubtitleSet, field: TextField) -> Result<Option<f64>, SubtitleError> {
    let mut chars = 0usize;
    let mut duration_ms = 0i64;
    for entry in set.iter() {
        if entry.duration_ms() <= 0 {
            return Err(SubtitleError::Domain(format!(
                "Entry {} has a duration of {} ms",
                entry.original_index,
                entry.duration_ms()
            )));
        }
        chars += entry.char_count(field).unwrap_or_default();
        duration_ms += entry.duration_ms();
    }

    if duration_ms == 0 {
        return Ok(None);
    }
    char_rate(chars, duration_ms).map(Some)
}
