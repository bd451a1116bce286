/*!
 * Per-language track processing.
 *
 * Every target language owns an independent subtitle set, so tracks are
 * combined in parallel on tokio's blocking pool. A track either completes
 * atomically or fails on its own; other tracks are never affected.
 */

use std::sync::Arc;
use futures::future::join_all;
use log::{info, warn};
use tokio::sync::Semaphore;

use crate::combiner::{self, CombineOptions, CombineReport};
use crate::errors::{SubtitleError, TrackError};
use crate::language_utils;
use crate::subtitle_processor::SubtitleSet;

/// A translated subtitle set for one target language
#[derive(Debug, Clone)]
pub struct Track {
    /// Normalized language code
    pub language: String,
    pub subtitles: SubtitleSet,
}

impl Track {
    /// Create a track, normalizing the language code when it is a known one
    pub fn new(language: &str, subtitles: SubtitleSet) -> Self {
        let language = match language_utils::normalize_to_part1_or_part2t(language) {
            Ok(code) => code,
            Err(e) => {
                warn!("Language code issue: {}", e);
                language.trim().to_string()
            }
        };
        Track { language, subtitles }
    }
}

/// Result of processing one track
#[derive(Debug)]
pub struct TrackOutcome {
    pub language: String,
    pub result: Result<(SubtitleSet, CombineReport), TrackError>,
}

impl TrackOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Combine one track synchronously.
///
/// With `combine_enabled` false the set is only checked for complete
/// translations and returned unchanged.
pub fn process_track(track: Track, options: CombineOptions, combine_enabled: bool) -> Result<(SubtitleSet, CombineReport), TrackError> {
    let Track { language, subtitles } = track;
    let wrap = |source: SubtitleError| TrackError::Subtitle {
        language: language.clone(),
        source,
    };

    if combine_enabled {
        return combiner::combine(subtitles, options).map_err(wrap);
    }

    if let Some(entry) = subtitles.iter().find(|e| e.translated_text.is_none()) {
        return Err(wrap(SubtitleError::Precondition(format!(
            "Entry {} has no translated text",
            entry.original_index
        ))));
    }
    let report = CombineReport {
        input_count: subtitles.len(),
        output_count: subtitles.len(),
        ..CombineReport::default()
    };
    Ok((subtitles, report))
}

/// Runs the combiner over several tracks with bounded parallelism
#[derive(Debug, Clone)]
pub struct TrackRunner {
    options: CombineOptions,
    combine_enabled: bool,
    max_concurrent_tracks: usize,
}

impl TrackRunner {
    pub fn new(options: CombineOptions, max_concurrent_tracks: usize) -> Self {
        Self {
            options,
            combine_enabled: true,
            max_concurrent_tracks: max_concurrent_tracks.max(1),
        }
    }

    /// Pass translated sets through without merging
    pub fn with_combining(mut self, enabled: bool) -> Self {
        self.combine_enabled = enabled;
        self
    }

    /// Process all tracks; outcomes come back in input order
    pub async fn run(&self, tracks: Vec<Track>) -> Vec<TrackOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_tracks));

        let tasks = tracks.into_iter().map(|track| {
            let semaphore = Arc::clone(&semaphore);
            let options = self.options;
            let combine_enabled = self.combine_enabled;

            async move {
                let language = track.language.clone();
                let aborted = |message: String| TrackError::Aborted {
                    language: language.clone(),
                    message,
                };

                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => tokio::task::spawn_blocking(move || process_track(track, options, combine_enabled))
                        .await
                        .unwrap_or_else(|e| Err(aborted(e.to_string()))),
                    Err(e) => Err(aborted(e.to_string())),
                };

                match &result {
                    Ok((_, report)) => info!(
                        "Track {} ({}): {} entries -> {} entries ({} merges)",
                        language,
                        language_utils::get_language_name(&language).unwrap_or_else(|_| "unknown language".to_string()),
                        report.input_count,
                        report.output_count,
                        report.merges_performed()
                    ),
                    Err(e) => warn!("{}", e),
                }

                TrackOutcome { language, result }
            }
        });

        join_all(tasks).await
    }
}
