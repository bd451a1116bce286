use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SubtitleError;

// @module: SRT timestamp line codec

// @const: Full timestamp line, hours of any width
static TIMESTAMP_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+):(\d{2}):(\d{2}),(\d{3}) --> (\d+):(\d{2}):(\d{2}),(\d{3})$").unwrap()
});

/// Separator between the two instants of a timestamp line
pub const ARROW: &str = " --> ";

/// Check whether a (trimmed) line is a timestamp line
pub fn is_timestamp_line(line: &str) -> bool {
    TIMESTAMP_LINE_REGEX.is_match(line.trim())
}

/// Parse `H:MM:SS,mmm --> H:MM:SS,mmm` into start and end milliseconds.
///
/// `line_no` is only used to locate the error message.
pub fn parse_line(line: &str, line_no: usize) -> Result<(i64, i64), SubtitleError> {
    let trimmed = line.trim();
    let caps = TIMESTAMP_LINE_REGEX.captures(trimmed).ok_or_else(|| {
        SubtitleError::format(line_no, format!("Invalid timestamp line: '{}'", trimmed))
    })?;

    let start = instant_from_captures(&caps, 1, line_no)?;
    let end = instant_from_captures(&caps, 5, line_no)?;
    Ok((start, end))
}

/// Parse a single `H:MM:SS,mmm` instant to milliseconds
pub fn parse_timestamp(timestamp: &str) -> Result<i64, SubtitleError> {
    let line = format!("{}{}{}", timestamp.trim(), ARROW, timestamp.trim());
    parse_line(&line, 0).map(|(start, _)| start)
}

fn instant_from_captures(
    caps: &regex::Captures,
    start_idx: usize,
    line_no: usize,
) -> Result<i64, SubtitleError> {
    let field = |offset: usize| -> Result<i64, SubtitleError> {
        caps.get(start_idx + offset)
            .map(|m| m.as_str())
            .unwrap_or_default()
            .parse::<i64>()
            .map_err(|e| SubtitleError::format(line_no, format!("Invalid timestamp field: {}", e)))
    };

    let hours = field(0)?;
    let minutes = field(1)?;
    let seconds = field(2)?;
    let millis = field(3)?;

    if minutes >= 60 || seconds >= 60 {
        return Err(SubtitleError::format(
            line_no,
            format!("Minutes and seconds must be below 60, got {:02}:{:02}", minutes, seconds),
        ));
    }

    hours
        .checked_mul(3_600_000)
        .and_then(|ms| ms.checked_add(minutes * 60_000 + seconds * 1_000 + millis))
        .ok_or_else(|| SubtitleError::format(line_no, "Timestamp out of range"))
}

/// Format milliseconds as `H:MM:SS,mmm`.
///
/// Hours are not padded. Negative instants (possible after an oversized
/// buffer) are clamped at zero.
pub fn format_timestamp(ms: i64) -> String {
    let ms = ms.max(0);
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Format a start/end pair as a timestamp line
pub fn format_line(start_ms: i64, end_ms: i64) -> String {
    format!("{}{}{}", format_timestamp(start_ms), ARROW, format_timestamp(end_ms))
}
