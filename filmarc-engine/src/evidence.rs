//! Dialogue evidence for minute offsets
//!
//! Grounds a peak or divergence point in what was actually said. For each
//! requested minute the linker collects the dialogue lines overlapping
//! `[minute*60, minute*60+60)` seconds and keeps the longest ones, using
//! length as a salience proxy.
//!
//! Degradation rules:
//! - no transcript for the track → empty mapping
//! - transcript present, nothing said in that minute → one placeholder
//!
//! The linker never invents dialogue.

use filmarc_common::{DialogueLine, Error, Result, TranscriptSource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Text of the placeholder excerpt for a silent minute
pub const NO_DIALOGUE_PLACEHOLDER: &str = "[no dialogue in this minute]";

/// Marker appended to truncated excerpts
pub const ELLIPSIS: &str = "...";

/// Seconds per minute bucket
const BUCKET_SECONDS: f64 = 60.0;

/// One quoted line (or the silent-minute placeholder)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueExcerpt {
    pub minute_offset: u32,
    /// Possibly truncated text
    pub text: String,
    /// Character count of the full original line
    pub length: usize,
    pub truncated: bool,
    pub placeholder: bool,
}

impl DialogueExcerpt {
    fn placeholder(minute_offset: u32) -> Self {
        Self {
            minute_offset,
            text: NO_DIALOGUE_PLACEHOLDER.to_string(),
            length: 0,
            truncated: false,
            placeholder: true,
        }
    }
}

/// Minute offset → ranked excerpts
pub type ExcerptMap = BTreeMap<u32, Vec<DialogueExcerpt>>;

/// Evidence linker
#[derive(Debug, Clone, Copy)]
pub struct EvidenceLinker {
    /// Excerpts kept per minute (default: 3)
    max_excerpts: usize,
    /// Character budget per excerpt before the ellipsis (default: 200)
    max_chars: usize,
}

impl EvidenceLinker {
    pub fn new() -> Self {
        Self {
            max_excerpts: 3,
            max_chars: 200,
        }
    }

    pub fn with_max_excerpts(mut self, max_excerpts: usize) -> Result<Self> {
        if max_excerpts == 0 {
            return Err(Error::InvalidInput(
                "Excerpts per minute must be >= 1".to_string(),
            ));
        }
        self.max_excerpts = max_excerpts;
        Ok(self)
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Result<Self> {
        if max_chars == 0 {
            return Err(Error::InvalidInput(
                "Excerpt character budget must be >= 1".to_string(),
            ));
        }
        self.max_chars = max_chars;
        Ok(self)
    }

    /// Look up excerpts for a track through a transcript source
    pub fn excerpts(
        &self,
        source: &dyn TranscriptSource,
        entity_id: &str,
        language: &str,
        minute_offsets: &[u32],
    ) -> ExcerptMap {
        match source.dialogue(entity_id, language) {
            Some(lines) => self.excerpts_from_lines(lines, minute_offsets),
            None => {
                debug!(entity_id, language, "No transcript available");
                ExcerptMap::new()
            }
        }
    }

    /// Rank excerpts from already-retrieved dialogue lines
    pub fn excerpts_from_lines(&self, lines: &[DialogueLine], minute_offsets: &[u32]) -> ExcerptMap {
        let mut map = ExcerptMap::new();

        for &minute in minute_offsets {
            if map.contains_key(&minute) {
                continue;
            }

            let window_start = minute as f64 * BUCKET_SECONDS;
            let window_end = window_start + BUCKET_SECONDS;

            let mut candidates: Vec<&DialogueLine> = lines
                .iter()
                .filter(|l| !l.text.trim().is_empty())
                .filter(|l| l.intersects(window_start, window_end))
                .collect();

            // Longest first; equal lengths keep the earlier line
            candidates.sort_by(|a, b| {
                salience(b)
                    .cmp(&salience(a))
                    .then(a.start_seconds.total_cmp(&b.start_seconds))
            });

            let excerpts: Vec<DialogueExcerpt> = if candidates.is_empty() {
                vec![DialogueExcerpt::placeholder(minute)]
            } else {
                candidates
                    .into_iter()
                    .take(self.max_excerpts)
                    .map(|l| self.excerpt(minute, l.text.trim()))
                    .collect()
            };

            map.insert(minute, excerpts);
        }

        map
    }

    fn excerpt(&self, minute_offset: u32, text: &str) -> DialogueExcerpt {
        let length = text.chars().count();
        let (text, truncated) = truncate_chars(text, self.max_chars);
        DialogueExcerpt {
            minute_offset,
            text,
            length,
            truncated,
            placeholder: false,
        }
    }
}

impl Default for EvidenceLinker {
    fn default() -> Self {
        Self::new()
    }
}

fn salience(line: &DialogueLine) -> usize {
    line.text.trim().chars().count()
}

/// Cut to `max_chars` characters (not bytes) and append the ellipsis
fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut cut = text[..byte_idx].trim_end().to_string();
            cut.push_str(ELLIPSIS);
            (cut, true)
        }
        None => (text.to_string(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(start: f64, end: f64, text: &str) -> DialogueLine {
        DialogueLine::new("m", "en", start, end, text)
    }

    #[test]
    fn test_silent_minute_gets_one_placeholder() {
        let lines = vec![line(5.0, 8.0, "Only in minute zero")];
        let map = EvidenceLinker::new().excerpts_from_lines(&lines, &[4]);

        let excerpts = &map[&4];
        assert_eq!(excerpts.len(), 1);
        assert!(excerpts[0].placeholder);
        assert_eq!(excerpts[0].text, NO_DIALOGUE_PLACEHOLDER);
    }

    #[test]
    fn test_caps_at_three_longest() {
        let lines = vec![
            line(60.0, 62.0, "short"),
            line(63.0, 65.0, "a much longer line of dialogue"),
            line(66.0, 68.0, "medium length"),
            line(69.0, 71.0, "the longest line of dialogue in this minute"),
            line(72.0, 74.0, "tiny"),
        ];
        let map = EvidenceLinker::new().excerpts_from_lines(&lines, &[1]);

        let texts: Vec<&str> = map[&1].iter().map(|e| e.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "the longest line of dialogue in this minute",
                "a much longer line of dialogue",
                "medium length",
            ]
        );
    }

    #[test]
    fn test_equal_length_keeps_earlier_line() {
        let lines = vec![line(30.0, 31.0, "bbbb"), line(10.0, 11.0, "aaaa")];
        let map = EvidenceLinker::new()
            .with_max_excerpts(1)
            .unwrap()
            .excerpts_from_lines(&lines, &[0]);
        assert_eq!(map[&0][0].text, "aaaa");
    }

    #[test]
    fn test_line_spanning_boundary_counts_for_both_minutes() {
        let lines = vec![line(58.0, 63.0, "Spanning the boundary")];
        let map = EvidenceLinker::new().excerpts_from_lines(&lines, &[0, 1, 2]);
        assert!(!map[&0][0].placeholder);
        assert!(!map[&1][0].placeholder);
        assert!(map[&2][0].placeholder);
    }

    #[test]
    fn test_truncation_with_ellipsis() {
        let long = "x".repeat(250);
        let lines = vec![line(0.0, 5.0, &long)];
        let map = EvidenceLinker::new().excerpts_from_lines(&lines, &[0]);

        let excerpt = &map[&0][0];
        assert!(excerpt.truncated);
        assert_eq!(excerpt.length, 250);
        assert_eq!(excerpt.text.chars().count(), 200 + ELLIPSIS.len());
        assert!(excerpt.text.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let (cut, truncated) = truncate_chars("héllo wörld", 4);
        assert!(truncated);
        assert_eq!(cut, "héll...");

        let (whole, truncated) = truncate_chars("short", 10);
        assert!(!truncated);
        assert_eq!(whole, "short");
    }

    #[test]
    fn test_blank_lines_ignored() {
        let lines = vec![line(0.0, 2.0, "   ")];
        let map = EvidenceLinker::new().excerpts_from_lines(&lines, &[0]);
        assert!(map[&0][0].placeholder);
    }

    struct NoTranscripts;

    impl TranscriptSource for NoTranscripts {
        fn dialogue(&self, _entity_id: &str, _language: &str) -> Option<&[DialogueLine]> {
            None
        }
    }

    #[test]
    fn test_missing_transcript_is_empty_mapping() {
        let map = EvidenceLinker::new().excerpts(&NoTranscripts, "m", "en", &[0, 1]);
        assert!(map.is_empty());
    }
}
