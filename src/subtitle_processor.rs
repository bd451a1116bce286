use std::fmt;
use std::fmt::Write as _;
use std::path::Path;
use anyhow::{Context, Result};
use log::{debug, warn};

use crate::errors::SubtitleError;
use crate::file_utils::FileManager;
use crate::timestamp;

// @module: Subtitle parsing, translation handoff and serialization

/// Which text of an entry an operation reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    /// Source-language cue text
    Original,
    /// Target-language text supplied by the translation step
    Translated,
}

impl fmt::Display for TextField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Original => write!(f, "text"),
            Self::Translated => write!(f, "translated_text"),
        }
    }
}

// @struct: Single timed cue
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    // @field: Cue number as parsed, reassigned only when a combined set is re-indexed
    pub original_index: usize,

    // @field: Start time in ms (buffered when a buffer was applied)
    pub start_ms: i64,

    // @field: End time in ms (buffered when a buffer was applied)
    pub end_ms: i64,

    // @field: Start time shifted inward by the buffer
    pub start_ms_buffered: i64,

    // @field: End time shifted inward by the buffer
    pub end_ms_buffered: i64,

    // @field: Source text, lines folded with spaces
    pub text: String,

    // @field: Target-language text
    pub translated_text: Option<String>,

    // @field: Silence from this cue's end to the next cue's start
    pub break_until_next_ms: i64,
}

impl SubtitleEntry {
    /// Creates an unbuffered entry with no translation and no known gap
    pub fn new(original_index: usize, start_ms: i64, end_ms: i64, text: impl Into<String>) -> Self {
        SubtitleEntry {
            original_index,
            start_ms,
            end_ms,
            start_ms_buffered: start_ms,
            end_ms_buffered: end_ms,
            text: text.into(),
            translated_text: None,
            break_until_next_ms: 0,
        }
    }

    /// Builder-style setter for the translated text
    pub fn with_translation(mut self, translated_text: impl Into<String>) -> Self {
        self.translated_text = Some(translated_text.into());
        self
    }

    /// Builder-style setter for the gap to the next cue
    pub fn with_break_until_next(mut self, break_ms: i64) -> Self {
        self.break_until_next_ms = break_ms;
        self
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    /// May be negative when the buffer exceeds half the cue duration
    pub fn duration_ms_buffered(&self) -> i64 {
        self.end_ms_buffered - self.start_ms_buffered
    }

    /// Canonical `start --> end` line, always derived from the current boundaries
    pub fn timestamp_line(&self) -> String {
        timestamp::format_line(self.start_ms, self.end_ms)
    }

    /// Text of the requested field; `None` when the translation is missing
    pub fn field_text(&self, field: TextField) -> Option<&str> {
        match field {
            TextField::Original => Some(self.text.as_str()),
            TextField::Translated => self.translated_text.as_deref(),
        }
    }

    /// Length of the requested field in Unicode scalar values
    pub fn char_count(&self, field: TextField) -> Option<usize> {
        self.field_text(field).map(|text| text.chars().count())
    }

    /// Absorb the entry that immediately follows this one.
    ///
    /// Texts are joined with a single space, the end boundaries move to the
    /// absorbed entry's, and the gap to the next cue becomes the absorbed
    /// entry's gap.
    pub fn absorb(&mut self, next: SubtitleEntry) {
        self.text = join_text(&self.text, &next.text);
        self.translated_text = match (self.translated_text.take(), next.translated_text) {
            (Some(a), Some(b)) => Some(join_text(&a, &b)),
            (a, b) => a.or(b),
        };
        self.end_ms = next.end_ms;
        self.end_ms_buffered = next.end_ms_buffered;
        self.break_until_next_ms = next.break_until_next_ms;
    }

    /// Write this entry as an SRT block with the given cue number
    fn write_block(&self, out: &mut String, number: usize, field: TextField) -> Result<(), SubtitleError> {
        let text = self.field_text(field).ok_or_else(|| {
            SubtitleError::Precondition(format!(
                "Entry {} has no {} to serialize",
                self.original_index, field
            ))
        })?;

        // Writing into a String cannot fail
        let _ = writeln!(out, "{}", number);
        let _ = writeln!(out, "{}", self.timestamp_line());
        let _ = writeln!(out, "{}", text);
        let _ = writeln!(out);
        Ok(())
    }
}

fn join_text(a: &str, b: &str) -> String {
    let mut joined = String::with_capacity(a.len() + b.len() + 1);
    joined.push_str(a);
    joined.push(' ');
    joined.push_str(b);
    joined
}

/// Ordered subtitle track
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubtitleSet {
    /// Entries in temporal order
    pub entries: Vec<SubtitleEntry>,
}

impl SubtitleSet {
    pub fn new(entries: Vec<SubtitleEntry>) -> Self {
        SubtitleSet { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SubtitleEntry> {
        self.entries.iter()
    }

    /// Read and parse an SRT file, stripping a UTF-8 byte order mark
    pub fn read_from_file<P: AsRef<Path>>(path: P, buffer_ms: i64) -> Result<Self> {
        let path = path.as_ref();
        let content = FileManager::read_to_string(path)?;
        Self::parse_srt_string(&content, buffer_ms)
            .with_context(|| format!("Failed to parse subtitle file: {}", path.display()))
    }

    /// Parse SRT content held in a single string
    pub fn parse_srt_string(content: &str, buffer_ms: i64) -> Result<Self, SubtitleError> {
        let lines: Vec<&str> = content.lines().collect();
        Self::parse_lines(&lines, buffer_ms)
    }

    /// Parse raw SRT lines into an ordered set.
    ///
    /// A line holding only an integer opens a cue and must be followed by a
    /// timestamp line; the non-blank lines after it, up to the next blank
    /// line, are joined with single spaces. With a positive `buffer_ms` the
    /// buffered boundaries replace `start_ms`/`end_ms`. Gaps between cues are
    /// measured before buffering.
    pub fn parse_lines<S: AsRef<str>>(lines: &[S], buffer_ms: i64) -> Result<Self, SubtitleError> {
        if buffer_ms < 0 {
            return Err(SubtitleError::Precondition(format!(
                "Buffer must not be negative, got {} ms",
                buffer_ms
            )));
        }

        let mut entries: Vec<SubtitleEntry> = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let trimmed = clean_line(lines[i].as_ref(), i);

            if trimmed.is_empty() {
                i += 1;
                continue;
            }

            if !is_index_line(trimmed) {
                warn!("Ignoring unexpected text at line {}: {}", i + 1, trimmed);
                i += 1;
                continue;
            }

            let index: usize = trimmed
                .parse()
                .map_err(|e| SubtitleError::format(i + 1, format!("Invalid cue number '{}': {}", trimmed, e)))?;

            let timestamp_line = lines
                .get(i + 1)
                .map(|l| l.as_ref())
                .ok_or_else(|| SubtitleError::format(i + 1, format!("Cue {} has no timestamp line", index)))?;
            let (start_ms, end_ms) = timestamp::parse_line(timestamp_line, i + 2)?;

            let mut text_lines: Vec<&str> = Vec::new();
            let mut j = i + 2;
            while j < lines.len() {
                let text_line = lines[j].as_ref().trim();
                if text_line.is_empty() {
                    break;
                }
                text_lines.push(text_line);
                j += 1;
            }

            if let Some(previous) = entries.last() {
                if index != previous.original_index + 1 {
                    warn!("Cue number {} follows {} at line {}", index, previous.original_index, i + 1);
                }
                if start_ms < previous.start_ms {
                    warn!("Cue {} starts before the previous cue", index);
                }
            }

            entries.push(SubtitleEntry::new(index, start_ms, end_ms, text_lines.join(" ")));
            i = j;
        }

        for k in 1..entries.len() {
            let gap = entries[k].start_ms - entries[k - 1].end_ms;
            entries[k - 1].break_until_next_ms = gap;
        }

        if buffer_ms > 0 {
            for entry in entries.iter_mut() {
                entry.start_ms_buffered = entry.start_ms + buffer_ms;
                entry.end_ms_buffered = entry.end_ms - buffer_ms;
                if entry.duration_ms_buffered() <= 0 {
                    warn!(
                        "Buffer of {} ms leaves cue {} with a non-positive duration ({} ms)",
                        buffer_ms,
                        entry.original_index,
                        entry.duration_ms_buffered()
                    );
                }
                entry.start_ms = entry.start_ms_buffered;
                entry.end_ms = entry.end_ms_buffered;
            }
        }

        if entries.is_empty() {
            warn!("No subtitle entries found in content");
        } else {
            debug!("Parsed {} subtitle entries (buffer {} ms)", entries.len(), buffer_ms);
        }

        Ok(SubtitleSet { entries })
    }

    /// Fill `translated_text` from a list of texts in entry order.
    ///
    /// The translation step must neither add nor remove entries.
    pub fn apply_translations(&mut self, translations: Vec<String>) -> Result<(), SubtitleError> {
        if translations.len() != self.entries.len() {
            return Err(SubtitleError::Precondition(format!(
                "Translation count mismatch: {} entries, {} translations",
                self.entries.len(),
                translations.len()
            )));
        }

        for (entry, translated) in self.entries.iter_mut().zip(translations) {
            entry.translated_text = Some(translated);
        }
        Ok(())
    }

    /// Fill `translated_text` from a parsed translated track with the same cues
    pub fn attach_translation(&mut self, translated: &SubtitleSet) -> Result<(), SubtitleError> {
        if let Some((ours, theirs)) = self
            .entries
            .iter()
            .zip(translated.entries.iter())
            .find(|(ours, theirs)| ours.original_index != theirs.original_index)
        {
            return Err(SubtitleError::Precondition(format!(
                "Translated track is out of order: cue {} paired with cue {}",
                ours.original_index, theirs.original_index
            )));
        }

        self.apply_translations(translated.entries.iter().map(|e| e.text.clone()).collect())
    }

    /// Number entries 1..=N in their current order
    pub fn reindex(&mut self) {
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.original_index = i + 1;
        }
    }

    /// Serialize the set as SRT, numbering cues by position
    pub fn to_srt_string(&self, field: TextField) -> Result<String, SubtitleError> {
        let mut out = String::new();
        for (i, entry) in self.entries.iter().enumerate() {
            entry.write_block(&mut out, i + 1, field)?;
        }
        Ok(out)
    }

    /// Write the set to an SRT file, creating parent directories as needed
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P, field: TextField) -> Result<()> {
        let content = self.to_srt_string(field)?;
        FileManager::write_to_file(path, &content)
    }
}

fn clean_line(line: &str, line_idx: usize) -> &str {
    let line = if line_idx == 0 { line.trim_start_matches('\u{feff}') } else { line };
    line.trim()
}

fn is_index_line(line: &str) -> bool {
    !line.is_empty() && line.bytes().all(|b| b.is_ascii_digit())
}
