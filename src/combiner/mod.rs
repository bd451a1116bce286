/*!
 * Rate-normalizing combiner.
 *
 * Merges temporally adjacent entries so that the speaking rate of each
 * translated entry moves towards a target rate. Each pass takes a fresh
 * snapshot of the entries, walks them from the largest deviation down, and
 * performs at most one merge before restarting. A pass without a merge is
 * a fixed point and ends the run. Every merge removes one entry, so a set
 * of N entries is settled after at most N - 1 merges.
 *
 * - `arena`: entry storage with stable handles
 * - `pass`: per-pass snapshot and merge selection
 */

use log::debug;

use crate::errors::SubtitleError;
use crate::speaking_rate::DEFAULT_TARGET_RATE;
use crate::subtitle_processor::SubtitleSet;

pub use self::arena::{EntryArena, EntryHandle};
pub use self::pass::Neighbor;

pub mod arena;
mod pass;

use self::pass::PassView;

/// Largest gap in ms that a merge may bridge (exclusive)
pub const DEFAULT_GAP_THRESHOLD_MS: i64 = 100;

/// Default limit on the translated length of a merged entry
pub const DEFAULT_MAX_CHARS: usize = 200;

/// Parameters of a combiner run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombineOptions {
    /// Target speaking rate in characters per second
    pub target_rate: f64,
    /// Gaps at or above this many ms are never bridged
    pub gap_threshold_ms: i64,
    /// Maximum translated length of a merged entry
    pub max_chars: usize,
}

impl Default for CombineOptions {
    fn default() -> Self {
        Self {
            target_rate: DEFAULT_TARGET_RATE,
            gap_threshold_ms: DEFAULT_GAP_THRESHOLD_MS,
            max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

impl CombineOptions {
    pub fn with_max_chars(max_chars: usize) -> Self {
        Self {
            max_chars,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), SubtitleError> {
        if self.max_chars == 0 {
            return Err(SubtitleError::Precondition("max_chars must be positive".to_string()));
        }
        if !self.target_rate.is_finite() || self.target_rate <= 0.0 {
            return Err(SubtitleError::Precondition(format!(
                "target_rate must be a positive number, got {}",
                self.target_rate
            )));
        }
        if self.gap_threshold_ms < 0 {
            return Err(SubtitleError::Precondition(format!(
                "gap_threshold_ms must not be negative, got {}",
                self.gap_threshold_ms
            )));
        }
        Ok(())
    }
}

/// One merge performed by the combiner
#[derive(Debug, Clone, PartialEq)]
pub struct MergeRecord {
    /// Pass in which the merge happened, starting at 1
    pub pass: usize,
    /// Cue whose rate deviation triggered the merge
    pub candidate_index: usize,
    /// Which neighbor of the candidate it merged with
    pub neighbor: Neighbor,
    /// Cue that absorbed the other
    pub survivor_index: usize,
    /// Cue that was removed
    pub absorbed_index: usize,
    /// Rate of the candidate before the merge
    pub candidate_rate: f64,
}

/// Outcome of a combiner run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombineReport {
    pub input_count: usize,
    pub output_count: usize,
    /// Passes run, including the final pass that found nothing
    pub passes: usize,
    pub merges: Vec<MergeRecord>,
}

impl CombineReport {
    pub fn merges_performed(&self) -> usize {
        self.merges.len()
    }
}

/// Combiner state over one subtitle set
#[derive(Debug)]
pub struct Combiner {
    arena: EntryArena,
    options: CombineOptions,
    report: CombineReport,
    settled: bool,
}

impl Combiner {
    /// Check every precondition before any merge happens.
    ///
    /// Fails when an entry has no translation, a non-positive duration, or
    /// starts before its predecessor, or when the options are invalid.
    pub fn new(set: SubtitleSet, options: CombineOptions) -> Result<Self, SubtitleError> {
        options.validate()?;

        let mut previous_start: Option<i64> = None;
        for entry in set.iter() {
            if entry.translated_text.is_none() {
                return Err(SubtitleError::Precondition(format!(
                    "Entry {} has no translated text",
                    entry.original_index
                )));
            }
            if entry.duration_ms() <= 0 {
                return Err(SubtitleError::Precondition(format!(
                    "Entry {} has a non-positive duration of {} ms",
                    entry.original_index,
                    entry.duration_ms()
                )));
            }
            if previous_start.is_some_and(|start| entry.start_ms < start) {
                return Err(SubtitleError::Precondition(format!(
                    "Entry {} starts before the entry preceding it",
                    entry.original_index
                )));
            }
            previous_start = Some(entry.start_ms);
        }

        let input_count = set.len();
        Ok(Combiner {
            arena: EntryArena::from_entries(set.entries),
            options,
            report: CombineReport {
                input_count,
                output_count: input_count,
                ..CombineReport::default()
            },
            settled: false,
        })
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Whether the last pass found no merge
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn report(&self) -> &CombineReport {
        &self.report
    }

    /// Run one pass. Returns the merge it performed, or `None` at the fixed point.
    pub fn step(&mut self) -> Result<Option<MergeRecord>, SubtitleError> {
        if self.settled {
            return Ok(None);
        }

        self.report.passes += 1;
        let view = PassView::build(&self.arena, self.options.target_rate)?;

        let Some(decision) = view.decide(&self.options) else {
            self.settled = true;
            return Ok(None);
        };

        let survivor = &view.candidates[decision.survivor_position()];
        let absorbed = &view.candidates[decision.survivor_position() + 1];
        let (survivor_index, absorbed_index) = (survivor.original_index, absorbed.original_index);
        let candidate = &view.candidates[decision.candidate];

        if !self.arena.merge_pair(survivor.handle, absorbed.handle) {
            return Err(SubtitleError::Precondition(format!(
                "Cannot merge entry {} with entry {}",
                survivor_index, absorbed_index
            )));
        }

        let record = MergeRecord {
            pass: self.report.passes,
            candidate_index: candidate.original_index,
            neighbor: decision.neighbor,
            survivor_index,
            absorbed_index,
            candidate_rate: candidate.rate.char_rate,
        };
        debug!(
            "Pass {}: entry {} at {:.2} cps merged with {:?} neighbor ({} absorbs {})",
            record.pass, record.candidate_index, record.candidate_rate, record.neighbor, survivor_index, absorbed_index
        );

        self.report.output_count = self.arena.len();
        self.report.merges.push(record.clone());
        Ok(Some(record))
    }

    /// Run passes until one performs no merge, then re-index the result from 1
    pub fn run(mut self) -> Result<(SubtitleSet, CombineReport), SubtitleError> {
        while self.step()?.is_some() {}

        let mut set = SubtitleSet::new(self.arena.into_entries());
        set.reindex();
        self.report.output_count = set.len();

        debug!(
            "Combined {} entries into {} after {} passes",
            self.report.input_count, self.report.output_count, self.report.passes
        );
        Ok((set, self.report))
    }
}

/// Combine a translated subtitle set with the given options
pub fn combine(set: SubtitleSet, options: CombineOptions) -> Result<(SubtitleSet, CombineReport), SubtitleError> {
    Combiner::new(set, options)?.run()
}
