/*!
 * Error types for the subpace library.
 *
 * Subtitle parsing and combining report failures through `SubtitleError`.
 * Every variant is fatal for the subtitle set being processed; nothing in
 * this crate performs I/O against a remote service, so nothing is retried.
 */

use thiserror::Error;

/// Errors raised while parsing, rating or combining a subtitle set
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubtitleError {
    /// Malformed timestamp line or cue structure
    #[error("Format error at line {line}: {message}")]
    Format {
        /// 1-based input line, 0 when the error is not tied to a line
        line: usize,
        /// What was wrong with it
        message: String,
    },

    /// Input violates a requirement of the operation (missing translation,
    /// non-positive duration, invalid parameter)
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Numeric model evaluated outside its domain
    #[error("Domain error: {0}")]
    Domain(String),
}

impl SubtitleError {
    pub(crate) fn format(line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            line,
            message: message.into(),
        }
    }
}

/// A failure scoped to one language track
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackError {
    /// The track's subtitles could not be processed
    #[error("Track '{language}' failed: {source}")]
    Subtitle {
        language: String,
        #[source]
        source: SubtitleError,
    },

    /// The worker processing the track stopped before finishing
    #[error("Track '{language}' was aborted: {message}")]
    Aborted { language: String, message: String },
}

impl TrackError {
    /// Language code of the failed track
    pub fn language(&self) -> &str {
        match self {
            Self::Subtitle { language, .. } | Self::Aborted { language, .. } => language,
        }
    }
}
