//! Compound sentiment scoring
//!
//! Reduces a 28-dimension [`EmotionVector`] to one scalar polarity in [-1, 1].
//!
//! Two strategies:
//! - **Averaged**: mean(positive group) − mean(negative group)
//! - **Dominant**: the single strongest positive or negative emotion, signed
//!
//! Missing emotions read as 0.0, so an empty vector scores 0.0 (neutral)
//! under both strategies. Scoring never fails.

use filmarc_common::{Emotion, EmotionRecord, EmotionVector, Error, Polarity, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Compound scoring strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompoundStrategy {
    #[default]
    Averaged,
    Dominant,
}

impl fmt::Display for CompoundStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompoundStrategy::Averaged => write!(f, "averaged"),
            CompoundStrategy::Dominant => write!(f, "dominant"),
        }
    }
}

impl FromStr for CompoundStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "averaged" | "average" | "mean" => Ok(CompoundStrategy::Averaged),
            "dominant" | "max" => Ok(CompoundStrategy::Dominant),
            other => Err(Error::InvalidInput(format!(
                "Unknown compound strategy '{}' (expected 'averaged' or 'dominant')",
                other
            ))),
        }
    }
}

/// Result of the dominant-emotion strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DominantScore {
    /// Signed intensity: +P* or −N*
    pub compound: f64,
    /// Emotion that won
    pub emotion: Emotion,
    /// Raw (unsigned) intensity of the winning emotion
    pub intensity: f64,
}

/// One scored minute of a track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredMinute {
    pub minute_offset: u32,
    pub compound: f64,
    #[serde(skip)]
    pub emotions: EmotionVector,
}

impl ScoredMinute {
    pub fn new(minute_offset: u32, compound: f64, emotions: EmotionVector) -> Self {
        Self {
            minute_offset,
            compound,
            emotions,
        }
    }
}

/// Compound scorer
///
/// Stateless apart from the chosen strategy; clone freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompoundScorer {
    strategy: CompoundStrategy,
}

impl CompoundScorer {
    pub fn new(strategy: CompoundStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> CompoundStrategy {
        self.strategy
    }

    /// mean(positive) − mean(negative)
    ///
    /// Both means lie in [0, 1] for inputs in [0, 1], so the result lies in
    /// [-1, 1] without clamping.
    pub fn averaged(vector: &EmotionVector) -> f64 {
        vector.polarity_mean(Polarity::Positive) - vector.polarity_mean(Polarity::Negative)
    }

    /// Signed max-intensity emotion
    ///
    /// When the strongest positive and strongest negative intensities are
    /// equal, positive wins. An all-zero vector therefore yields +0.0 with
    /// the first positive emotion in taxonomy order.
    pub fn dominant(vector: &EmotionVector) -> DominantScore {
        let (pos_emotion, pos_max) = vector.polarity_max(Polarity::Positive);
        let (neg_emotion, neg_max) = vector.polarity_max(Polarity::Negative);

        if pos_max >= neg_max {
            DominantScore {
                compound: pos_max,
                emotion: pos_emotion,
                intensity: pos_max,
            }
        } else {
            DominantScore {
                compound: -neg_max,
                emotion: neg_emotion,
                intensity: neg_max,
            }
        }
    }

    /// Score one vector with the configured strategy
    pub fn score(&self, vector: &EmotionVector) -> f64 {
        match self.strategy {
            CompoundStrategy::Averaged => Self::averaged(vector),
            CompoundStrategy::Dominant => Self::dominant(vector).compound,
        }
    }

    /// Score every record of a track, sorted by minute offset
    pub fn score_series(&self, records: &[EmotionRecord]) -> Vec<ScoredMinute> {
        let mut series: Vec<ScoredMinute> = records
            .iter()
            .map(|r| ScoredMinute::new(r.minute_offset, self.score(&r.emotions), r.emotions))
            .collect();
        series.sort_by_key(|m| m.minute_offset);

        debug!(
            strategy = %self.strategy,
            minutes = series.len(),
            "Scored series"
        );

        series
    }
}

/// Centered moving average of the compound channel
///
/// The window is counted in series points, not minutes. Edges use the
/// partial window. Window 1 returns the series unchanged.
pub fn rolling_mean(series: &[ScoredMinute], window: usize) -> Result<Vec<ScoredMinute>> {
    if window == 0 {
        return Err(Error::InvalidInput(
            "Smoothing window must be at least 1".to_string(),
        ));
    }
    if window == 1 {
        return Ok(series.to_vec());
    }

    let behind = (window - 1) / 2;
    let ahead = window / 2;

    let smoothed = series
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let start = i.saturating_sub(behind);
            let end = (i + ahead + 1).min(series.len());
            let slice = &series[start..end];
            let mean = slice.iter().map(|m| m.compound).sum::<f64>() / slice.len() as f64;
            ScoredMinute::new(point.minute_offset, mean, point.emotions)
        })
        .collect();

    Ok(smoothed)
}
