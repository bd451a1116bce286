use anyhow::{Result, Context, anyhow};
use log::{error, warn, info};
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::speaking_rate::{self, RateReportLine};
use crate::subtitle_processor::{SubtitleSet, TextField};
use crate::tracks::{Track, TrackRunner};

// @module: Application controller for subtitle re-segmentation

/// Extension appended after the language code of written tracks
pub const OUTPUT_EXTENSION: &str = "combined.srt";

/// A translated track supplied by the caller
#[derive(Debug, Clone)]
pub struct TranslationInput {
    /// Language code as given
    pub language: String,
    /// SRT file with the same cues as the source, text translated
    pub path: PathBuf,
}

/// What happened to one language track
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSummary {
    pub language: String,
    pub output_path: Option<PathBuf>,
    pub input_count: usize,
    pub output_count: usize,
    pub error: Option<String>,
    /// Output already existed and overwriting was not forced
    pub skipped: bool,
}

/// Rate report of one subtitle file
#[derive(Debug, Clone, PartialEq)]
pub struct RateSummary {
    pub lines: Vec<RateReportLine>,
    /// Duration-weighted rate of the whole file
    pub average: Option<f64>,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parse the source, attach every translation, combine the tracks and
    /// write one file per language.
    ///
    /// A translation that cannot be loaded or combined fails only its own
    /// track. The call fails when the source itself cannot be parsed.
    pub async fn run(
        &self,
        source: &Path,
        translations: &[TranslationInput],
        output_dir: &Path,
        force_overwrite: bool,
    ) -> Result<Vec<TrackSummary>> {
        let start_time = std::time::Instant::now();

        if !FileManager::file_exists(source) {
            return Err(anyhow!("Source subtitle file does not exist: {:?}", source));
        }
        if !FileManager::is_subtitle_file(source)? {
            return Err(anyhow!("Source is not an SRT subtitle file: {:?}", source));
        }
        FileManager::ensure_dir(output_dir)?;

        let buffer_ms = self.config.parse.buffer_ms;
        let source_set = SubtitleSet::read_from_file(source, buffer_ms)?;
        info!("Loaded {} cues from {:?}", source_set.len(), source);

        let mut summaries = Vec::new();
        let mut tracks = Vec::new();

        for input in translations {
            let track = match self.load_track(&source_set, input) {
                Ok(track) => track,
                Err(e) => {
                    error!("Skipping translation {:?}: {:#}", input.path, e);
                    summaries.push(TrackSummary {
                        language: input.language.clone(),
                        output_path: None,
                        input_count: source_set.len(),
                        output_count: 0,
                        error: Some(format!("{:#}", e)),
                        skipped: false,
                    });
                    continue;
                }
            };

            // Unknown codes never match through isolang, so compare them verbatim too
            let duplicate = tracks.iter().any(|t: &Track| {
                t.language == track.language || language_utils::language_codes_match(&t.language, &track.language)
            });
            if duplicate {
                error!("Skipping translation {:?}: language {} is given more than once", input.path, track.language);
                summaries.push(TrackSummary {
                    language: track.language,
                    output_path: None,
                    input_count: source_set.len(),
                    output_count: 0,
                    error: Some("Duplicate target language".to_string()),
                    skipped: false,
                });
                continue;
            }

            let output_path = FileManager::generate_output_path(source, output_dir, &track.language, OUTPUT_EXTENSION);
            if output_path.exists() && !force_overwrite {
                warn!("Skipping {}, output already exists (use -f to force overwrite): {:?}", track.language, output_path);
                summaries.push(TrackSummary {
                    language: track.language,
                    output_path: None,
                    input_count: source_set.len(),
                    output_count: 0,
                    error: None,
                    skipped: true,
                });
                continue;
            }
            tracks.push(track);
        }

        let runner = TrackRunner::new(self.config.combine.options(), self.config.tracks.max_concurrent_tracks)
            .with_combining(self.config.combine.enabled);

        for outcome in runner.run(tracks).await {
            let summary = match outcome.result {
                Ok((set, report)) => {
                    let output_path =
                        FileManager::generate_output_path(source, output_dir, &outcome.language, OUTPUT_EXTENSION);
                    match set.write_to_srt(&output_path, TextField::Translated) {
                        Ok(()) => TrackSummary {
                            language: outcome.language,
                            output_path: Some(output_path),
                            input_count: report.input_count,
                            output_count: report.output_count,
                            error: None,
                            skipped: false,
                        },
                        Err(e) => {
                            error!("Failed to write {:?}: {:#}", output_path, e);
                            TrackSummary {
                                language: outcome.language,
                                output_path: None,
                                input_count: report.input_count,
                                output_count: report.output_count,
                                error: Some(format!("{:#}", e)),
                                skipped: false,
                            }
                        }
                    }
                }
                Err(e) => TrackSummary {
                    language: outcome.language,
                    output_path: None,
                    input_count: source_set.len(),
                    output_count: 0,
                    error: Some(e.to_string()),
                    skipped: false,
                },
            };
            summaries.push(summary);
        }

        info!("Processed {} track(s) in {:.2?}", summaries.len(), start_time.elapsed());
        Ok(summaries)
    }

    /// Source set with `translated_text` taken from one translated file
    fn load_track(&self, source_set: &SubtitleSet, input: &TranslationInput) -> Result<Track> {
        let translated = SubtitleSet::read_from_file(&input.path, 0)?;
        let mut set = source_set.clone();
        set.attach_translation(&translated)
            .with_context(|| format!("Translation {:?} does not match the source", input.path))?;
        Ok(Track::new(&input.language, set))
    }

    /// Speaking-rate report of a file's source text
    pub fn rate_report(&self, path: &Path) -> Result<RateSummary> {
        if !FileManager::is_subtitle_file(path)? {
            return Err(anyhow!("Not an SRT subtitle file: {:?}", path));
        }
        let set = SubtitleSet::read_from_file(path, self.config.parse.buffer_ms)?;
        let lines = speaking_rate::rate_report(&set, TextField::Original, self.config.combine.target_rate)
            .with_context(|| format!("Cannot rate {:?}", path))?;
        let average = speaking_rate::average_rate(&set, TextField::Original)?;
        Ok(RateSummary { lines, average })
    }

    /// Rate reports for every SRT file below a directory
    pub fn rate_report_folder(&self, dir: &Path) -> Result<Vec<(PathBuf, Result<RateSummary>)>> {
        let files = FileManager::find_files(dir, "srt")?;
        if files.is_empty() {
            warn!("No subtitle files found in {:?}", dir);
        }
        Ok(files
            .into_iter()
            .map(|file| {
                let report = self.rate_report(&file);
                (file, report)
            })
            .collect())
    }
}
