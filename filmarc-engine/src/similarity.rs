//! Emotional similarity between entities
//!
//! Each entity is reduced to an emotion fingerprint: its mean emotion vector
//! over all scored minutes. In affect-only mode (the default) the neutral
//! dimension is dropped and the remaining 27 are renormalized to sum to 1.0,
//! so films are compared on the shape of their affect rather than on how
//! much dialogue the classifier found neutral.
//!
//! Similarity is derived from Euclidean distance by linear rescaling against
//! the largest distance in the same batch. The result is corpus-relative:
//! the same pair can score differently in a different batch.

use filmarc_common::{Emotion, EmotionRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Explains how batch similarities should be read
pub const CORPUS_RELATIVE_NOTE: &str = "Similarity is rescaled against the largest distance \
observed in this comparison batch (0 distance = 1.0, largest = 0.0). It is relative to the \
compared set, not an absolute measure.";

/// Magnitude below this is treated as zero
const MAGNITUDE_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintMode {
    /// Neutral dropped, 27 dimensions renormalized to sum 1.0
    #[default]
    AffectOnly,
    /// Plain mean over all 28 dimensions
    Raw,
}

/// Normalized emotion distribution of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionFingerprint {
    pub entity_id: String,
    pub mode: FingerprintMode,
    /// Minutes averaged into the fingerprint
    pub minutes: usize,
    pub values: BTreeMap<Emotion, f64>,
}

impl EmotionFingerprint {
    pub fn get(&self, emotion: Emotion) -> Option<f64> {
        self.values.get(&emotion).copied()
    }

    pub fn sum(&self) -> f64 {
        self.values.values().sum()
    }

    pub fn magnitude(&self) -> f64 {
        self.values.values().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// No usable signal (no minutes, or every score zero)
    pub fn is_degenerate(&self) -> bool {
        self.magnitude() < MAGNITUDE_EPSILON
    }
}

/// One compared pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityPair {
    pub entity_a: String,
    pub entity_b: String,
    /// `None` when either fingerprint is degenerate
    pub distance: Option<f64>,
    pub cosine: f64,
    /// Batch-relative similarity in [0, 1]
    pub similarity: Option<f64>,
}

/// Entity ranked by similarity to a target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntity {
    pub entity_id: String,
    pub similarity: Option<f64>,
    pub distance: Option<f64>,
    pub cosine: f64,
}

/// All pairwise comparisons of a batch of fingerprints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityBatch {
    pub max_observed_distance: f64,
    pub pairs: Vec<SimilarityPair>,
    pub note: String,
}

impl SimilarityBatch {
    pub fn pair(&self, a: &str, b: &str) -> Option<&SimilarityPair> {
        self.pairs.iter().find(|p| {
            (p.entity_a == a && p.entity_b == b) || (p.entity_a == b && p.entity_b == a)
        })
    }

    /// Entities closest to `target`, most similar first
    ///
    /// Pairs without a similarity (degenerate fingerprints) sort last.
    pub fn rank_against(&self, target: &str, top_n: usize) -> Vec<RankedEntity> {
        let mut ranked: Vec<RankedEntity> = self
            .pairs
            .iter()
            .filter_map(|p| {
                let other = if p.entity_a == target {
                    &p.entity_b
                } else if p.entity_b == target {
                    &p.entity_a
                } else {
                    return None;
                };
                Some(RankedEntity {
                    entity_id: other.clone(),
                    similarity: p.similarity,
                    distance: p.distance,
                    cosine: p.cosine,
                })
            })
            .collect();

        ranked.sort_by(|a, b| match (a.similarity, b.similarity) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        ranked.truncate(top_n);
        ranked
    }
}

/// Similarity engine
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityEngine {
    mode: FingerprintMode,
}

impl SimilarityEngine {
    pub fn new(mode: FingerprintMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> FingerprintMode {
        self.mode
    }

    /// Mean emotion vector of an entity's records
    ///
    /// No records, or all-zero affect, produce a degenerate all-zero
    /// fingerprint rather than an error.
    pub fn vectorize(&self, entity_id: &str, records: &[EmotionRecord]) -> EmotionFingerprint {
        let dimensions: Vec<Emotion> = match self.mode {
            FingerprintMode::AffectOnly => Emotion::ALL
                .iter()
                .copied()
                .filter(|&e| e != Emotion::Neutral)
                .collect(),
            FingerprintMode::Raw => Emotion::ALL.to_vec(),
        };

        let mut values: BTreeMap<Emotion, f64> = dimensions.iter().map(|&e| (e, 0.0)).collect();

        if !records.is_empty() {
            let n = records.len() as f64;
            for (emotion, value) in values.iter_mut() {
                *value = records.iter().map(|r| r.emotions.get(*emotion)).sum::<f64>() / n;
            }
        }

        if self.mode == FingerprintMode::AffectOnly {
            let total: f64 = values.values().sum();
            if total > MAGNITUDE_EPSILON {
                for value in values.values_mut() {
                    *value /= total;
                }
            }
        }

        debug!(
            entity_id,
            minutes = records.len(),
            mode = ?self.mode,
            "Built emotion fingerprint"
        );

        EmotionFingerprint {
            entity_id: entity_id.to_string(),
            mode: self.mode,
            minutes: records.len(),
            values,
        }
    }

    /// Euclidean distance over dimensions present in both fingerprints
    pub fn distance(a: &EmotionFingerprint, b: &EmotionFingerprint) -> Option<f64> {
        if a.is_degenerate() || b.is_degenerate() {
            return None;
        }
        let sum_sq: f64 = shared_dimensions(a, b).map(|(x, y)| (x - y).powi(2)).sum();
        Some(sum_sq.sqrt())
    }

    /// Cosine similarity over shared dimensions; 0.0 for a zero-magnitude side
    pub fn cosine_similarity(a: &EmotionFingerprint, b: &EmotionFingerprint) -> f64 {
        let mut dot = 0.0;
        let mut mag_a = 0.0;
        let mut mag_b = 0.0;
        for (x, y) in shared_dimensions(a, b) {
            dot += x * y;
            mag_a += x * x;
            mag_b += y * y;
        }
        let mag_a = f64::sqrt(mag_a);
        let mag_b = f64::sqrt(mag_b);
        if mag_a < MAGNITUDE_EPSILON || mag_b < MAGNITUDE_EPSILON {
            return 0.0;
        }
        (dot / (mag_a * mag_b)).clamp(-1.0, 1.0)
    }

    /// Rescale a distance to [0, 1] against the batch maximum
    ///
    /// 0 → 1.0 and `max_observed_distance` → 0.0. A non-positive maximum
    /// means every compared pair was identical, so similarity is 1.0.
    pub fn to_similarity(distance: f64, max_observed_distance: f64) -> f64 {
        if max_observed_distance <= 0.0 {
            return 1.0;
        }
        (1.0 - distance / max_observed_distance).clamp(0.0, 1.0)
    }

    /// Compare every pair in a batch
    pub fn compare_batch(&self, fingerprints: &[EmotionFingerprint]) -> SimilarityBatch {
        let mut raw: Vec<(usize, usize, Option<f64>, f64)> = Vec::new();
        for i in 0..fingerprints.len() {
            for j in (i + 1)..fingerprints.len() {
                let a = &fingerprints[i];
                let b = &fingerprints[j];
                raw.push((i, j, Self::distance(a, b), Self::cosine_similarity(a, b)));
            }
        }

        let max_observed_distance = raw
            .iter()
            .filter_map(|(_, _, d, _)| *d)
            .fold(0.0_f64, f64::max);

        let pairs = raw
            .into_iter()
            .map(|(i, j, distance, cosine)| SimilarityPair {
                entity_a: fingerprints[i].entity_id.clone(),
                entity_b: fingerprints[j].entity_id.clone(),
                distance,
                cosine,
                similarity: distance.map(|d| Self::to_similarity(d, max_observed_distance)),
            })
            .collect::<Vec<_>>();

        debug!(
            entities = fingerprints.len(),
            pairs = pairs.len(),
            max_observed_distance,
            "Compared similarity batch"
        );

        SimilarityBatch {
            max_observed_distance,
            pairs,
            note: CORPUS_RELATIVE_NOTE.to_string(),
        }
    }
}

fn shared_dimensions<'a>(
    a: &'a EmotionFingerprint,
    b: &'a EmotionFingerprint,
) -> impl Iterator<Item = (f64, f64)> + 'a {
    a.values
        .iter()
        .filter_map(move |(emotion, &x)| b.values.get(emotion).map(|&y| (x, y)))
}
