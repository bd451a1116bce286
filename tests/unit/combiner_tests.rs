/*!
 * Tests for the rate-normalizing combiner
 */

use anyhow::Result;
use subpace::combiner::{combine, CombineOptions, Combiner, Neighbor};
use subpace::errors::SubtitleError;
use subpace::speaking_rate::SpeakingRate;
use subpace::subtitle_processor::{SubtitleSet, TextField};
use crate::common::{self, translated_entry, translated_set};

/// Fast cue next to a slow one across a short gap
#[test]
fn test_combine_withFastAndSlowPair_shouldMergeIntoOne() -> Result<()> {
    let set = translated_set(&[(1_000, 5, 50), (1_000, 45, 0)]);
    let (combined, report) = combine(set, CombineOptions::default())?;

    assert_eq!(combined.len(), 1);
    let merged = &combined.entries[0];
    assert_eq!(merged.start_ms, 0);
    assert_eq!(merged.end_ms, 2_050);
    assert_eq!(merged.char_count(TextField::Translated), Some(51));
    assert_eq!(merged.original_index, 1);

    let rate = SpeakingRate::of(merged, TextField::Translated, 20.0)?;
    assert_eq!(rate.char_rate, 24.88);

    assert_eq!(report.input_count, 2);
    assert_eq!(report.output_count, 1);
    assert_eq!(report.merges_performed(), 1);
    assert_eq!(report.merges[0].candidate_index, 2);
    assert_eq!(report.merges[0].neighbor, Neighbor::Previous);
    Ok(())
}

/// A gap at or above the threshold is never bridged
#[test]
fn test_combine_withWideGap_shouldNotMerge() -> Result<()> {
    let set = translated_set(&[(1_000, 5, 150), (1_000, 45, 0)]);
    let (combined, report) = combine(set.clone(), CombineOptions::default())?;
    assert_eq!(combined, set);
    assert_eq!(report.merges_performed(), 0);

    let at_threshold = translated_set(&[(1_000, 5, 100), (1_000, 45, 0)]);
    let (combined, _) = combine(at_threshold.clone(), CombineOptions::default())?;
    assert_eq!(combined, at_threshold);
    Ok(())
}

/// The slow outlier in the middle joins the neighbor with the larger signed diff
#[test]
fn test_step_withSlowMiddleEntry_shouldMergeBeforeLookingFurther() -> Result<()> {
    let set = SubtitleSet::new(vec![
        translated_entry(1, 0, 1_000, 19, 50),
        translated_entry(2, 1_050, 3_050, 4, 50),
        translated_entry(3, 3_100, 4_100, 21, 0),
    ]);
    let mut combiner = Combiner::new(set, CombineOptions::default())?;

    let first = combiner.step()?.expect("first pass should merge");
    assert_eq!(first.pass, 1);
    assert_eq!(first.candidate_index, 2);
    assert_eq!(first.candidate_rate, 2.0);
    assert_eq!(first.neighbor, Neighbor::Previous);
    assert_eq!((first.survivor_index, first.absorbed_index), (1, 2));
    assert_eq!(combiner.len(), 2);
    assert!(!combiner.is_settled());

    let (combined, report) = combiner.run()?;
    assert_eq!(combined.len(), 1);
    assert_eq!(combined.entries[0].end_ms, 4_100);
    assert_eq!(combined.entries[0].char_count(TextField::Translated), Some(46));
    assert_eq!(report.merges_performed(), 2);
    assert_eq!(report.passes, 3);
    Ok(())
}

/// A fast cue between two slower ones joins the neighbor with the smaller signed diff
#[test]
fn test_step_withFastMiddleAndSlowerNext_shouldMergeWithNext() -> Result<()> {
    let set = SubtitleSet::new(vec![
        translated_entry(1, 0, 1_000, 5, 50),
        translated_entry(2, 1_050, 2_050, 40, 50),
        translated_entry(3, 2_100, 3_100, 10, 0),
    ]);
    let mut combiner = Combiner::new(set, CombineOptions::default())?;

    // diffs 40 - 5 = 35 and 40 - 10 = 30: the next cue is closer
    let record = combiner.step()?.expect("first pass should merge");
    assert_eq!(record.candidate_index, 2);
    assert_eq!(record.candidate_rate, 40.0);
    assert_eq!(record.neighbor, Neighbor::Next);
    assert_eq!((record.survivor_index, record.absorbed_index), (2, 3));
    assert_eq!(combiner.len(), 2);
    Ok(())
}

/// Mirror of the case above: the previous cue is now the closer one
#[test]
fn test_step_withFastMiddleAndSlowerPrevious_shouldMergeWithPrevious() -> Result<()> {
    let set = SubtitleSet::new(vec![
        translated_entry(1, 0, 1_000, 10, 50),
        translated_entry(2, 1_050, 2_050, 40, 50),
        translated_entry(3, 2_100, 3_100, 5, 0),
    ]);
    let mut combiner = Combiner::new(set, CombineOptions::default())?;

    // diffs 40 - 10 = 30 and 40 - 5 = 35
    let record = combiner.step()?.expect("first pass should merge");
    assert_eq!(record.candidate_index, 2);
    assert_eq!(record.neighbor, Neighbor::Previous);
    assert_eq!((record.survivor_index, record.absorbed_index), (1, 2));
    Ok(())
}

/// The joined length limit rejects a merge that rate and gap allow
#[test]
fn test_combine_withOverlongResult_shouldRejectMerge() -> Result<()> {
    let set = translated_set(&[(1_000, 300, 20), (1_000, 10, 0)]);
    let (combined, report) = combine(set.clone(), CombineOptions::with_max_chars(200))?;

    assert_eq!(combined, set);
    assert_eq!(report.merges_performed(), 0);
    assert_eq!(report.passes, 1);
    Ok(())
}

/// The joining space counts towards the limit
#[test]
fn test_combine_withLengthExactlyAtLimit_shouldMerge() -> Result<()> {
    let at_limit = translated_set(&[(1_000, 60, 10), (1_000, 39, 0)]);
    let (combined, _) = combine(at_limit, CombineOptions::with_max_chars(100))?;
    assert_eq!(combined.len(), 1);
    assert_eq!(combined.entries[0].char_count(TextField::Translated), Some(100));

    let over_limit = translated_set(&[(1_000, 60, 10), (1_000, 40, 0)]);
    let (combined, _) = combine(over_limit, CombineOptions::with_max_chars(100))?;
    assert_eq!(combined.len(), 2);
    Ok(())
}

/// The merged entry keeps the gap of the entry it absorbed
#[test]
fn test_combine_withMerge_shouldInheritAbsorbedBreak() -> Result<()> {
    let set = translated_set(&[(1_000, 5, 50), (1_000, 45, 2_000), (1_000, 20, 0)]);
    let (combined, _) = combine(set, CombineOptions::default())?;

    assert_eq!(combined.len(), 2);
    assert_eq!(combined.entries[0].break_until_next_ms, 2_000);
    assert_eq!(combined.entries[1].original_index, 2);
    assert_eq!(combined.entries[1].start_ms, 4_050);
    Ok(())
}

/// Entries already at the target rate are left alone
#[test]
fn test_combine_withEntriesOnTarget_shouldKeepInput() -> Result<()> {
    let set = translated_set(&[(1_000, 20, 10), (2_000, 40, 10), (500, 10, 0)]);
    let (combined, report) = combine(set.clone(), CombineOptions::default())?;
    assert_eq!(combined, set);
    assert_eq!(report.passes, 1);
    Ok(())
}

/// Missing translations are rejected before any merge
#[test]
fn test_combiner_new_withMissingTranslation_shouldFail() {
    let mut set = translated_set(&[(1_000, 5, 50), (1_000, 45, 0)]);
    set.entries[0].translated_text = None;

    let err = Combiner::new(set, CombineOptions::default()).unwrap_err();
    assert!(matches!(err, SubtitleError::Precondition(_)));
}

/// Degenerate buffered cues are rejected rather than rated
#[test]
fn test_combiner_new_withNonPositiveDuration_shouldFail() -> Result<()> {
    let content = "1\n00:00:01,000 --> 00:00:01,150\nQuick\n\n2\n00:00:02,000 --> 00:00:04,000\nSlow\n";
    let mut set = SubtitleSet::parse_srt_string(content, 100)?;
    set.apply_translations(vec!["Vite".to_string(), "Lent".to_string()])?;

    let err = Combiner::new(set, CombineOptions::default()).unwrap_err();
    assert!(matches!(err, SubtitleError::Precondition(_)));
    Ok(())
}

/// Invalid options are rejected
#[test]
fn test_combiner_new_withInvalidOptions_shouldFail() {
    let set = translated_set(&[(1_000, 5, 0)]);
    let options = CombineOptions {
        target_rate: 0.0,
        ..CombineOptions::default()
    };
    assert!(Combiner::new(set.clone(), options).is_err());
    assert!(Combiner::new(set, CombineOptions::with_max_chars(0)).is_err());
}

/// Empty and single-entry sets are already settled
#[test]
fn test_combine_withTrivialSets_shouldReturnInput() -> Result<()> {
    let (combined, report) = combine(SubtitleSet::default(), CombineOptions::default())?;
    assert!(combined.is_empty());
    assert_eq!(report.passes, 1);

    let single = translated_set(&[(1_000, 90, 0)]);
    let (combined, _) = combine(single.clone(), CombineOptions::default())?;
    assert_eq!(combined, single);
    Ok(())
}

/// Combining a combined set changes nothing
#[test]
fn test_combine_withCombinedOutput_shouldBeIdempotent() -> Result<()> {
    for seed in 0..20 {
        let set = common::pseudo_random_set(seed, 40);
        let (once, _) = combine(set, CombineOptions::default())?;
        let (twice, report) = combine(once.clone(), CombineOptions::default())?;
        assert_eq!(twice, once, "seed {}", seed);
        assert_eq!(report.merges_performed(), 0);
    }
    Ok(())
}

/// Structural properties over many generated sets
#[test]
fn test_combine_withGeneratedSets_shouldPreserveContentAndBounds() -> Result<()> {
    common::init_test_logger();
    let options = CombineOptions::with_max_chars(120);

    for seed in 0..50 {
        let input = common::pseudo_random_set(seed, 60);
        let (output, report) = combine(input.clone(), options)?;

        // Merges only ever remove entries, one per pass
        assert!(output.len() <= input.len());
        assert_eq!(input.len() - output.len(), report.merges_performed());
        assert!(report.passes <= input.len());

        // The timeline still starts and ends where it did
        assert_eq!(output.entries.first().map(|e| e.start_ms), input.entries.first().map(|e| e.start_ms));
        assert_eq!(output.entries.last().map(|e| e.end_ms), input.entries.last().map(|e| e.end_ms));

        // No text is lost or reordered
        let join = |set: &SubtitleSet| {
            set.iter()
                .filter_map(|e| e.translated_text.clone())
                .collect::<Vec<_>>()
                .join(" ")
        };
        assert_eq!(join(&output), join(&input), "seed {}", seed);

        // Every merged entry obeys the length limit and only bridged short gaps
        let mut cursor = 0;
        for (position, entry) in output.iter().enumerate() {
            assert_eq!(entry.original_index, position + 1);

            let covered: Vec<_> = input.entries[cursor..]
                .iter()
                .take_while(|e| e.end_ms <= entry.end_ms)
                .collect();
            assert!(!covered.is_empty());
            cursor += covered.len();

            if covered.len() > 1 {
                assert!(entry.char_count(TextField::Translated).unwrap_or_default() <= options.max_chars);
                for inner in &covered[..covered.len() - 1] {
                    assert!(inner.break_until_next_ms < options.gap_threshold_ms, "seed {}", seed);
                }
            }
            assert_eq!(entry.break_until_next_ms, covered[covered.len() - 1].break_until_next_ms);
        }
        assert_eq!(cursor, input.len());
    }
    Ok(())
}

/// Stepping after the fixed point does nothing
#[test]
fn test_step_afterFixedPoint_shouldReturnNone() -> Result<()> {
    let set = translated_set(&[(1_000, 5, 50), (1_000, 45, 0)]);
    let mut combiner = Combiner::new(set, CombineOptions::default())?;

    assert!(combiner.step()?.is_some());
    assert!(combiner.step()?.is_none());
    assert!(combiner.is_settled());
    assert!(combiner.step()?.is_none());
    assert_eq!(combiner.report().passes, 2);
    Ok(())
}
