/*!
 * # subpace - subtitle pacing for translated tracks
 *
 * A Rust library that re-segments translated SRT subtitles so that every
 * cue is read at a comfortable speed.
 *
 * ## Features
 *
 * - Parse and write SRT files, with an optional inward timing buffer
 * - Measure speaking rate (characters per second) of source or translated text
 * - Merge adjacent cues whose translated text is too fast or too slow to read
 * - Process several target languages concurrently
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `timestamp`: SRT timestamp codec
 * - `subtitle_processor`: Subtitle entries, parsing and serialization
 * - `speaking_rate`: Character-rate model and rate reports
 * - `combiner`: Rate-normalizing merge of adjacent entries
 * - `tracks`: Concurrent per-language processing
 * - `app_config`: Configuration management
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod combiner;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod speaking_rate;
pub mod subtitle_processor;
pub mod timestamp;
pub mod tracks;

// Re-export main types for easier usage
pub use app_config::Config;
pub use combiner::{combine, CombineOptions, CombineReport, Combiner};
pub use subtitle_processor::{SubtitleEntry, SubtitleSet, TextField};
pub use speaking_rate::SpeakingRate;
pub use tracks::{Track, TrackRunner};
pub use language_utils::{language_codes_match, normalize_to_part1_or_part2t, get_language_name};
pub use errors::{SubtitleError, TrackError};
