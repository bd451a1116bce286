/*!
 * One combiner pass: a read-only snapshot of the current order with fresh
 * rates, and the search for the first admissible merge in priority order.
 */

use crate::errors::SubtitleError;
use crate::speaking_rate::SpeakingRate;
use crate::subtitle_processor::TextField;

use super::CombineOptions;
use super::arena::{EntryArena, EntryHandle};

/// Which neighbor of the candidate a merge joins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighbor {
    Previous,
    Next,
}

/// Snapshot of one entry at the start of a pass
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub handle: EntryHandle,
    pub original_index: usize,
    pub rate: SpeakingRate,
    pub char_count: usize,
    pub break_until_next_ms: i64,
}

/// The merge chosen by a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MergeDecision {
    /// Position of the candidate that triggered the merge
    pub candidate: usize,
    pub neighbor: Neighbor,
}

impl MergeDecision {
    /// Position of the earlier entry of the pair, which survives
    pub fn survivor_position(&self) -> usize {
        match self.neighbor {
            Neighbor::Previous => self.candidate - 1,
            Neighbor::Next => self.candidate,
        }
    }
}

#[derive(Debug)]
pub(crate) struct PassView {
    pub candidates: Vec<Candidate>,
}

impl PassView {
    /// Recompute positions and rates for the arena's current order
    pub fn build(arena: &EntryArena, target_rate: f64) -> Result<Self, SubtitleError> {
        let mut candidates = Vec::with_capacity(arena.len());
        for &handle in arena.handles() {
            let entry = arena.get(handle).ok_or_else(|| {
                SubtitleError::Precondition("Combiner order references an absorbed entry".to_string())
            })?;
            let rate = SpeakingRate::of(entry, TextField::Translated, target_rate)?;
            candidates.push(Candidate {
                handle,
                original_index: entry.original_index,
                rate,
                char_count: entry.char_count(TextField::Translated).unwrap_or_default(),
                break_until_next_ms: entry.break_until_next_ms,
            });
        }
        Ok(PassView { candidates })
    }

    /// Positions sorted by deviation from the target, largest first.
    /// The sort is stable, so equal deviations keep temporal order.
    pub fn priority(&self) -> Vec<usize> {
        let mut positions: Vec<usize> = (0..self.candidates.len()).collect();
        positions.sort_by(|&a, &b| {
            self.candidates[b]
                .rate
                .char_rate_diff
                .total_cmp(&self.candidates[a].rate.char_rate_diff)
        });
        positions
    }

    /// First admissible merge in priority order, if any
    pub fn decide(&self, options: &CombineOptions) -> Option<MergeDecision> {
        self.priority()
            .into_iter()
            .find_map(|position| self.decide_for(position, options))
    }

    fn decide_for(&self, position: usize, options: &CombineOptions) -> Option<MergeDecision> {
        let current = &self.candidates[position];
        if current.rate.char_rate == options.target_rate {
            return None;
        }
        let too_fast = current.rate.is_over(options.target_rate);

        let previous = position
            .checked_sub(1)
            .and_then(|p| self.eligible_diff(current, p, self.candidates[p].break_until_next_ms, too_fast, options));
        let next = (position + 1 < self.candidates.len())
            .then(|| self.eligible_diff(current, position + 1, current.break_until_next_ms, too_fast, options))
            .flatten();

        let neighbor = match (previous, next) {
            (None, None) => return None,
            (Some(_), None) => Neighbor::Previous,
            (None, Some(_)) => Neighbor::Next,
            // Too fast: the neighbor with the smaller diff. Too slow: the larger.
            // Equal diffs fall back to the previous entry.
            (Some(prev_diff), Some(next_diff)) => {
                let prefer_next = if too_fast { next_diff < prev_diff } else { next_diff > prev_diff };
                if prefer_next { Neighbor::Next } else { Neighbor::Previous }
            }
        };

        Some(MergeDecision {
            candidate: position,
            neighbor,
        })
    }

    /// Signed rate difference to the neighbor when a merge with it is allowed
    fn eligible_diff(
        &self,
        current: &Candidate,
        neighbor_position: usize,
        gap_ms: i64,
        too_fast: bool,
        options: &CombineOptions,
    ) -> Option<f64> {
        let neighbor = &self.candidates[neighbor_position];
        let diff = current.rate.char_rate - neighbor.rate.char_rate;

        let direction_ok = if too_fast { diff > 0.0 } else { diff < 0.0 };
        // The joining space counts towards the limit
        let combined_chars = current.char_count + 1 + neighbor.char_count;

        (direction_ok && gap_ms < options.gap_threshold_ms && combined_chars <= options.max_chars).then_some(diff)
    }
}
