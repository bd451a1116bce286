/*!
 * Tests for the SRT timestamp codec
 */

use subpace::errors::SubtitleError;
use subpace::timestamp::{format_line, format_timestamp, is_timestamp_line, parse_line, parse_timestamp};

/// Test parsing a standard timestamp line
#[test]
fn test_parse_line_withValidLine_shouldReturnStartAndEnd() {
    let (start, end) = parse_line("00:00:20,130 --> 00:00:23,419", 3).unwrap();
    assert_eq!(start, 20_130);
    assert_eq!(end, 23_419);
}

/// Test hour fields wider and narrower than two digits
#[test]
fn test_parse_timestamp_withUnpaddedHours_shouldParse() {
    assert_eq!(parse_timestamp("1:23:45,678").unwrap(), 5_025_678);
    assert_eq!(parse_timestamp("01:23:45,678").unwrap(), 5_025_678);
    assert_eq!(parse_timestamp("100:00:00,000").unwrap(), 360_000_000);
}

/// Test formatting keeps hours unpadded and other fields fixed width
#[test]
fn test_format_timestamp_withValues_shouldUseCanonicalForm() {
    assert_eq!(format_timestamp(0), "0:00:00,000");
    assert_eq!(format_timestamp(5_025_678), "1:23:45,678");
    assert_eq!(format_timestamp(3_599_999), "0:59:59,999");
    assert_eq!(format_line(1_000, 2_500), "0:00:01,000 --> 0:00:02,500");
}

/// Negative instants can appear after an oversized buffer
#[test]
fn test_format_timestamp_withNegativeValue_shouldClampToZero() {
    assert_eq!(format_timestamp(-40), "0:00:00,000");
}

/// Test that formatting and parsing agree
#[test]
fn test_format_then_parse_withSampleValues_shouldRoundTrip() {
    for ms in [0, 1, 999, 1_000, 59_999, 60_000, 3_600_000, 86_399_999, 360_000_123] {
        assert_eq!(parse_timestamp(&format_timestamp(ms)).unwrap(), ms);
    }
}

/// Test rejected lines report a format error with the line number
#[test]
fn test_parse_line_withMalformedLine_shouldReturnFormatError() {
    let cases = [
        "00:00:20.130 --> 00:00:23,419",
        "00:00:20,130 -> 00:00:23,419",
        "00:00:20,13 --> 00:00:23,419",
        "not a timestamp",
        "",
    ];
    for line in cases {
        match parse_line(line, 7) {
            Err(SubtitleError::Format { line, .. }) => assert_eq!(line, 7),
            other => panic!("expected format error for {:?}, got {:?}", line, other),
        }
    }
}

/// Minutes and seconds are bounded even though the pattern matches
#[test]
fn test_parse_line_withOutOfRangeMinutes_shouldFail() {
    assert!(parse_line("00:61:00,000 --> 00:62:00,000", 1).is_err());
    assert!(parse_line("00:00:60,000 --> 00:01:00,000", 1).is_err());
}

/// Test timestamp line detection tolerates surrounding whitespace
#[test]
fn test_is_timestamp_line_withVariants_shouldDetect() {
    assert!(is_timestamp_line("  00:00:01,000 --> 00:00:02,000  "));
    assert!(!is_timestamp_line("1"));
    assert!(!is_timestamp_line("Hello --> world"));
}
