//! Peak and valley detection over a scored series
//!
//! Picks the k most positive and k most negative minutes of a track and
//! explains each one with its strongest same-polarity emotions.
//!
//! # Threshold
//! - `threshold == 0.0`: every minute is a candidate for both lists
//! - `threshold > 0.0`: positive candidates need `compound >= threshold`,
//!   negative candidates need `compound <= -threshold`
//!
//! # Ordering
//! Positive peaks descend by compound, negative peaks ascend. Equal scores
//! keep minute order (earliest first).

use crate::scoring::ScoredMinute;
use filmarc_common::{Emotion, Error, Polarity, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Maximum number of contributing emotions reported per peak
pub const MAX_CONTRIBUTORS: usize = 3;

/// One emotion's share in a peak
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionContribution {
    pub emotion: Emotion,
    pub score: f64,
}

/// A salient minute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub minute_offset: u32,
    pub score: f64,
    pub polarity: Polarity,
    /// Strongest emotion of the minute across all 28 categories
    pub dominant_emotion: Emotion,
    /// Up to three non-zero same-polarity emotions, strongest first
    pub top_emotions: Vec<EmotionContribution>,
}

/// Positive peaks and negative valleys of one series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeakSet {
    pub positive: Vec<Peak>,
    pub negative: Vec<Peak>,
}

impl PeakSet {
    pub fn is_empty(&self) -> bool {
        self.positive.is_empty() && self.negative.is_empty()
    }

    /// Minute offsets of every peak, in list order, without duplicates
    pub fn minute_offsets(&self) -> Vec<u32> {
        let mut minutes = Vec::new();
        for peak in self.positive.iter().chain(self.negative.iter()) {
            if !minutes.contains(&peak.minute_offset) {
                minutes.push(peak.minute_offset);
            }
        }
        minutes
    }
}

/// Peak detector
#[derive(Debug, Clone, Copy)]
pub struct PeakDetector {
    /// Maximum peaks per polarity (default: 5)
    k: usize,
    /// Minimum polarity-specific magnitude (default: 0.0 = keep everything)
    threshold: f64,
}

impl PeakDetector {
    /// Create new peak detector with defaults
    pub fn new() -> Self {
        Self {
            k: 5,
            threshold: 0.0,
        }
    }

    /// Set number of peaks per polarity
    pub fn with_k(mut self, k: usize) -> Result<Self> {
        if k == 0 {
            return Err(Error::InvalidInput("Peak count k must be >= 1".to_string()));
        }
        self.k = k;
        Ok(self)
    }

    /// Set magnitude threshold
    pub fn with_threshold(mut self, threshold: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::InvalidInput(format!(
                "Peak threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        self.threshold = threshold;
        Ok(self)
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Extract top-k peaks and valleys
    ///
    /// Returns fewer than k per list when fewer minutes qualify. An empty
    /// series yields two empty lists.
    pub fn identify_peaks(&self, series: &[ScoredMinute]) -> PeakSet {
        if series.is_empty() {
            return PeakSet::default();
        }

        // Stable sorts below rely on minute order for tie-breaking
        let mut ordered: Vec<&ScoredMinute> = series.iter().collect();
        ordered.sort_by_key(|m| m.minute_offset);

        let keep_all = self.threshold == 0.0;

        let mut positive: Vec<&ScoredMinute> = ordered
            .iter()
            .copied()
            .filter(|m| keep_all || m.compound >= self.threshold)
            .collect();
        positive.sort_by(|a, b| b.compound.total_cmp(&a.compound));
        positive.truncate(self.k);

        let mut negative: Vec<&ScoredMinute> = ordered
            .iter()
            .copied()
            .filter(|m| keep_all || m.compound <= -self.threshold)
            .collect();
        negative.sort_by(|a, b| a.compound.total_cmp(&b.compound));
        negative.truncate(self.k);

        debug!(
            minutes = series.len(),
            positive = positive.len(),
            negative = negative.len(),
            k = self.k,
            threshold = self.threshold,
            "Identified peaks"
        );

        PeakSet {
            positive: positive
                .into_iter()
                .map(|m| Self::build_peak(m, Polarity::Positive))
                .collect(),
            negative: negative
                .into_iter()
                .map(|m| Self::build_peak(m, Polarity::Negative))
                .collect(),
        }
    }

    fn build_peak(minute: &ScoredMinute, polarity: Polarity) -> Peak {
        Peak {
            minute_offset: minute.minute_offset,
            score: minute.compound,
            polarity,
            dominant_emotion: minute.emotions.dominant().0,
            top_emotions: top_contributors(minute, polarity),
        }
    }
}

impl Default for PeakDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Strongest non-zero emotions of one polarity group, descending
fn top_contributors(minute: &ScoredMinute, polarity: Polarity) -> Vec<EmotionContribution> {
    let mut contributions: Vec<EmotionContribution> = Emotion::of_polarity(polarity)
        .iter()
        .map(|&emotion| EmotionContribution {
            emotion,
            score: minute.emotions.get(emotion),
        })
        .filter(|c| c.score > 0.0)
        .collect();
    contributions.sort_by(|a, b| b.score.total_cmp(&a.score));
    contributions.truncate(MAX_CONTRIBUTORS);
    contributions
}
