//! Entity-level metrics
//!
//! Named aggregates that turn a whole track (or an entity's outcome data)
//! into one number, so two of them can be fed to the
//! [`MetricCorrelator`](crate::correlation::MetricCorrelator).
//!
//! | Name                  | Value                                        |
//! |-----------------------|----------------------------------------------|
//! | `mean_compound`       | mean compound score                          |
//! | `compound_volatility` | population std-dev of the compound score     |
//! | `emotional_range`     | max − min compound score                     |
//! | `peak_positive`       | max compound score                           |
//! | `peak_negative`       | min compound score                           |
//! | `emotion:<name>`      | mean intensity of one emotion                |
//! | `outcome:<key>`       | external outcome value (box office, rating…) |

use crate::scoring::CompoundScorer;
use filmarc_common::{Emotion, EmotionRecord, EmotionSource, EntitySummary, Error, MetricSample, Result};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// A named entity-level metric
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityMetric {
    MeanCompound,
    CompoundVolatility,
    EmotionalRange,
    PeakPositive,
    PeakNegative,
    MeanEmotion(Emotion),
    Outcome(String),
}

impl EntityMetric {
    /// Compute the metric for one entity; `None` means no data
    pub fn evaluate(
        &self,
        scorer: &CompoundScorer,
        entity: &EntitySummary,
        records: Option<&[EmotionRecord]>,
    ) -> Option<f64> {
        let records = records.filter(|r| !r.is_empty());
        match self {
            EntityMetric::Outcome(key) => entity.outcome(key),
            EntityMetric::MeanEmotion(emotion) => records.map(|rs| {
                rs.iter().map(|r| r.emotions.get(*emotion)).sum::<f64>() / rs.len() as f64
            }),
            EntityMetric::MeanCompound => CompoundStats::of(scorer, records).map(|s| s.mean),
            EntityMetric::CompoundVolatility => {
                CompoundStats::of(scorer, records).map(|s| s.std_dev)
            }
            EntityMetric::EmotionalRange => {
                CompoundStats::of(scorer, records).map(|s| s.max - s.min)
            }
            EntityMetric::PeakPositive => CompoundStats::of(scorer, records).map(|s| s.max),
            EntityMetric::PeakNegative => CompoundStats::of(scorer, records).map(|s| s.min),
        }
    }
}

/// Summary of a track's compound scores
struct CompoundStats {
    mean: f64,
    std_dev: f64,
    min: f64,
    max: f64,
}

impl CompoundStats {
    fn of(scorer: &CompoundScorer, records: Option<&[EmotionRecord]>) -> Option<Self> {
        let records = records?;
        if records.is_empty() {
            return None;
        }
        let compounds: Vec<f64> = records.iter().map(|r| scorer.score(&r.emotions)).collect();
        let n = compounds.len() as f64;
        let mean = compounds.iter().sum::<f64>() / n;
        let variance = compounds.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            mean,
            std_dev: variance.sqrt(),
            min: compounds.iter().copied().fold(f64::INFINITY, f64::min),
            max: compounds.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

impl fmt::Display for EntityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityMetric::MeanCompound => write!(f, "mean_compound"),
            EntityMetric::CompoundVolatility => write!(f, "compound_volatility"),
            EntityMetric::EmotionalRange => write!(f, "emotional_range"),
            EntityMetric::PeakPositive => write!(f, "peak_positive"),
            EntityMetric::PeakNegative => write!(f, "peak_negative"),
            EntityMetric::MeanEmotion(emotion) => write!(f, "emotion:{}", emotion),
            EntityMetric::Outcome(key) => write!(f, "outcome:{}", key),
        }
    }
}

impl FromStr for EntityMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        match name {
            "mean_compound" => return Ok(EntityMetric::MeanCompound),
            "compound_volatility" => return Ok(EntityMetric::CompoundVolatility),
            "emotional_range" => return Ok(EntityMetric::EmotionalRange),
            "peak_positive" => return Ok(EntityMetric::PeakPositive),
            "peak_negative" => return Ok(EntityMetric::PeakNegative),
            _ => {}
        }

        if let Some(emotion) = name.strip_prefix("emotion:") {
            return emotion
                .parse::<Emotion>()
                .map(EntityMetric::MeanEmotion)
                .map_err(|_| Error::UnknownMetric(name.to_string()));
        }
        if let Some(key) = name.strip_prefix("outcome:") {
            if !key.trim().is_empty() {
                return Ok(EntityMetric::Outcome(key.trim().to_string()));
            }
        }

        Err(Error::UnknownMetric(name.to_string()))
    }
}

/// Builds metric samples for every entity of a store
#[derive(Clone, Copy)]
pub struct MetricExtractor<'a> {
    source: &'a dyn EmotionSource,
    scorer: CompoundScorer,
}

impl<'a> MetricExtractor<'a> {
    pub fn new(source: &'a dyn EmotionSource, scorer: CompoundScorer) -> Self {
        Self { source, scorer }
    }

    /// One (x, y) sample per entity, reading records from `language`
    pub fn samples(
        &self,
        metric_x: &EntityMetric,
        metric_y: &EntityMetric,
        language: &str,
    ) -> Vec<MetricSample> {
        let entities = self.source.entities();
        let samples: Vec<MetricSample> = entities
            .iter()
            .map(|entity| {
                let records = self.source.emotion_records(&entity.entity_id, language);
                MetricSample::new(
                    entity.entity_id.clone(),
                    metric_x.evaluate(&self.scorer, entity, records),
                    metric_y.evaluate(&self.scorer, entity, records),
                )
            })
            .collect();

        debug!(
            metric_x = %metric_x,
            metric_y = %metric_y,
            language,
            entities = samples.len(),
            complete = samples.iter().filter(|s| s.pair().is_some()).count(),
            "Extracted metric samples"
        );

        samples
    }
}
