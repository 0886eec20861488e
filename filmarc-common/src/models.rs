//! Data model shared by the store and the analysis engine
//!
//! Records are immutable once produced upstream; the engine only reads them.

use crate::emotions::EmotionVector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Emotion scores for one minute of one language track of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionRecord {
    pub entity_id: String,
    pub language: String,
    /// Minute bucket, unique per (entity, language)
    pub minute_offset: u32,
    #[serde(rename = "scores")]
    pub emotions: EmotionVector,
}

impl EmotionRecord {
    pub fn new(
        entity_id: impl Into<String>,
        language: impl Into<String>,
        minute_offset: u32,
        emotions: EmotionVector,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            language: language.into(),
            minute_offset,
            emotions,
        }
    }
}

/// One time-stamped line of dialogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub entity_id: String,
    pub language: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub text: String,
    #[serde(default)]
    pub speaker: Option<String>,
}

impl DialogueLine {
    pub fn new(
        entity_id: impl Into<String>,
        language: impl Into<String>,
        start_seconds: f64,
        end_seconds: f64,
        text: impl Into<String>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            language: language.into(),
            start_seconds,
            end_seconds,
            text: text.into(),
            speaker: None,
        }
    }

    /// Whether this line overlaps the half-open window `[start, end)`
    ///
    /// Zero-length lines count when their timestamp falls inside the window.
    pub fn intersects(&self, window_start: f64, window_end: f64) -> bool {
        if self.end_seconds <= self.start_seconds {
            return self.start_seconds >= window_start && self.start_seconds < window_end;
        }
        self.start_seconds < window_end && self.end_seconds > window_start
    }
}

/// Entity (film) metadata with external outcome metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub entity_id: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Outcome name → value; `null` marks a known-missing value
    #[serde(default)]
    pub outcomes: BTreeMap<String, Option<f64>>,
}

impl EntitySummary {
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            title: None,
            outcomes: BTreeMap::new(),
        }
    }

    pub fn with_outcome(mut self, name: impl Into<String>, value: Option<f64>) -> Self {
        self.outcomes.insert(name.into(), value);
        self
    }

    pub fn outcome(&self, name: &str) -> Option<f64> {
        self.outcomes.get(name).copied().flatten()
    }
}

/// One entity's pair of metric values for correlation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub entity_id: String,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl MetricSample {
    pub fn new(entity_id: impl Into<String>, x: Option<f64>, y: Option<f64>) -> Self {
        Self {
            entity_id: entity_id.into(),
            x,
            y,
        }
    }

    /// Both values, if both are present and finite
    pub fn pair(&self) -> Option<(f64, f64)> {
        match (self.x, self.y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((x, y)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialogue_intersects_minute_window() {
        let line = DialogueLine::new("m1", "en", 55.0, 65.0, "Across the boundary");
        assert!(line.intersects(0.0, 60.0));
        assert!(line.intersects(60.0, 120.0));
        assert!(!line.intersects(120.0, 180.0));
    }

    #[test]
    fn test_dialogue_window_is_half_open() {
        let ends_at_boundary = DialogueLine::new("m1", "en", 50.0, 60.0, "Ends at 60");
        assert!(ends_at_boundary.intersects(0.0, 60.0));
        assert!(!ends_at_boundary.intersects(60.0, 120.0));

        let instant = DialogueLine::new("m1", "en", 60.0, 60.0, "Instant");
        assert!(!instant.intersects(0.0, 60.0));
        assert!(instant.intersects(60.0, 120.0));
    }

    #[test]
    fn test_metric_sample_pair() {
        assert_eq!(MetricSample::new("a", Some(1.0), Some(2.0)).pair(), Some((1.0, 2.0)));
        assert_eq!(MetricSample::new("a", None, Some(2.0)).pair(), None);
        assert_eq!(MetricSample::new("a", Some(f64::NAN), Some(2.0)).pair(), None);
    }

    #[test]
    fn test_entity_outcome_null_is_missing() {
        let entity = EntitySummary::new("m1")
            .with_outcome("box_office", Some(1.5e8))
            .with_outcome("rating", None);
        assert_eq!(entity.outcome("box_office"), Some(1.5e8));
        assert_eq!(entity.outcome("rating"), None);
        assert_eq!(entity.outcome("awards"), None);
    }
}
