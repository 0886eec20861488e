//! Emotion taxonomy
//!
//! The 28 emotion categories produced by the upstream dialogue classifier,
//! partitioned into three polarity groups:
//! - Positive (11): admiration, amusement, approval, caring, desire,
//!   excitement, gratitude, joy, love, optimism, pride
//! - Negative (11): anger, annoyance, disappointment, disapproval, disgust,
//!   embarrassment, fear, grief, nervousness, remorse, sadness
//! - Other (6): confusion, curiosity, realization, relief, surprise, neutral
//!
//! [`EmotionVector`] stores one score per category. On the wire it is a plain
//! name → score map; names missing from the map read as 0.0.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Number of emotion categories in the taxonomy
pub const EMOTION_COUNT: usize = 28;

/// Polarity group of an emotion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
    Other,
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::Positive => write!(f, "positive"),
            Polarity::Negative => write!(f, "negative"),
            Polarity::Other => write!(f, "other"),
        }
    }
}

/// One of the 28 emotion categories
///
/// Declaration order is the canonical taxonomy order; it decides ties
/// wherever "first emotion wins".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Admiration,
    Amusement,
    Anger,
    Annoyance,
    Approval,
    Caring,
    Confusion,
    Curiosity,
    Desire,
    Disappointment,
    Disapproval,
    Disgust,
    Embarrassment,
    Excitement,
    Fear,
    Gratitude,
    Grief,
    Joy,
    Love,
    Nervousness,
    Optimism,
    Pride,
    Realization,
    Relief,
    Remorse,
    Sadness,
    Surprise,
    Neutral,
}

impl Emotion {
    /// All emotions in taxonomy order (index-aligned with [`EmotionVector`])
    pub const ALL: [Emotion; EMOTION_COUNT] = [
        Emotion::Admiration,
        Emotion::Amusement,
        Emotion::Anger,
        Emotion::Annoyance,
        Emotion::Approval,
        Emotion::Caring,
        Emotion::Confusion,
        Emotion::Curiosity,
        Emotion::Desire,
        Emotion::Disappointment,
        Emotion::Disapproval,
        Emotion::Disgust,
        Emotion::Embarrassment,
        Emotion::Excitement,
        Emotion::Fear,
        Emotion::Gratitude,
        Emotion::Grief,
        Emotion::Joy,
        Emotion::Love,
        Emotion::Nervousness,
        Emotion::Optimism,
        Emotion::Pride,
        Emotion::Realization,
        Emotion::Relief,
        Emotion::Remorse,
        Emotion::Sadness,
        Emotion::Surprise,
        Emotion::Neutral,
    ];

    pub const POSITIVE: [Emotion; 11] = [
        Emotion::Admiration,
        Emotion::Amusement,
        Emotion::Approval,
        Emotion::Caring,
        Emotion::Desire,
        Emotion::Excitement,
        Emotion::Gratitude,
        Emotion::Joy,
        Emotion::Love,
        Emotion::Optimism,
        Emotion::Pride,
    ];

    pub const NEGATIVE: [Emotion; 11] = [
        Emotion::Anger,
        Emotion::Annoyance,
        Emotion::Disappointment,
        Emotion::Disapproval,
        Emotion::Disgust,
        Emotion::Embarrassment,
        Emotion::Fear,
        Emotion::Grief,
        Emotion::Nervousness,
        Emotion::Remorse,
        Emotion::Sadness,
    ];

    pub const OTHER: [Emotion; 6] = [
        Emotion::Confusion,
        Emotion::Curiosity,
        Emotion::Realization,
        Emotion::Relief,
        Emotion::Surprise,
        Emotion::Neutral,
    ];

    /// Position of this emotion in [`Emotion::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name as used by the classifier output
    pub fn name(self) -> &'static str {
        match self {
            Emotion::Admiration => "admiration",
            Emotion::Amusement => "amusement",
            Emotion::Anger => "anger",
            Emotion::Annoyance => "annoyance",
            Emotion::Approval => "approval",
            Emotion::Caring => "caring",
            Emotion::Confusion => "confusion",
            Emotion::Curiosity => "curiosity",
            Emotion::Desire => "desire",
            Emotion::Disappointment => "disappointment",
            Emotion::Disapproval => "disapproval",
            Emotion::Disgust => "disgust",
            Emotion::Embarrassment => "embarrassment",
            Emotion::Excitement => "excitement",
            Emotion::Fear => "fear",
            Emotion::Gratitude => "gratitude",
            Emotion::Grief => "grief",
            Emotion::Joy => "joy",
            Emotion::Love => "love",
            Emotion::Nervousness => "nervousness",
            Emotion::Optimism => "optimism",
            Emotion::Pride => "pride",
            Emotion::Realization => "realization",
            Emotion::Relief => "relief",
            Emotion::Remorse => "remorse",
            Emotion::Sadness => "sadness",
            Emotion::Surprise => "surprise",
            Emotion::Neutral => "neutral",
        }
    }

    pub fn polarity(self) -> Polarity {
        if Self::POSITIVE.contains(&self) {
            Polarity::Positive
        } else if Self::NEGATIVE.contains(&self) {
            Polarity::Negative
        } else {
            Polarity::Other
        }
    }

    /// Emotions belonging to one polarity group
    pub fn of_polarity(polarity: Polarity) -> &'static [Emotion] {
        match polarity {
            Polarity::Positive => &Self::POSITIVE,
            Polarity::Negative => &Self::NEGATIVE,
            Polarity::Other => &Self::OTHER,
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Emotion {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Emotion::ALL
            .iter()
            .copied()
            .find(|e| e.name() == needle)
            .ok_or_else(|| crate::Error::InvalidInput(format!("Unknown emotion: {}", s)))
    }
}

/// Score per emotion category, each in [0, 1]
///
/// Values are not validated; the classifier contract guarantees the range.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct EmotionVector {
    scores: [f64; EMOTION_COUNT],
}

impl EmotionVector {
    /// All-zero vector (every emotion absent)
    pub fn zeros() -> Self {
        Self::default()
    }

    /// Build from (emotion, score) pairs; unlisted emotions stay at 0.0
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Emotion, f64)>,
    {
        let mut vector = Self::zeros();
        for (emotion, score) in pairs {
            vector.set(emotion, score);
        }
        vector
    }

    pub fn get(&self, emotion: Emotion) -> f64 {
        self.scores[emotion.index()]
    }

    pub fn set(&mut self, emotion: Emotion, score: f64) {
        self.scores[emotion.index()] = score;
    }

    /// Scores in taxonomy order
    pub fn as_array(&self) -> &[f64; EMOTION_COUNT] {
        &self.scores
    }

    /// (emotion, score) pairs in taxonomy order
    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f64)> + '_ {
        Emotion::ALL.iter().map(move |&e| (e, self.get(e)))
    }

    /// Mean score over one polarity group
    pub fn polarity_mean(&self, polarity: Polarity) -> f64 {
        let group = Emotion::of_polarity(polarity);
        group.iter().map(|&e| self.get(e)).sum::<f64>() / group.len() as f64
    }

    /// Highest-scoring emotion of one polarity group (taxonomy order on ties)
    pub fn polarity_max(&self, polarity: Polarity) -> (Emotion, f64) {
        let group = Emotion::of_polarity(polarity);
        let mut best = (group[0], self.get(group[0]));
        for &emotion in &group[1..] {
            let score = self.get(emotion);
            if score > best.1 {
                best = (emotion, score);
            }
        }
        best
    }

    /// Highest-scoring emotion overall (taxonomy order on ties)
    pub fn dominant(&self) -> (Emotion, f64) {
        let mut best = (Emotion::ALL[0], self.scores[0]);
        for (emotion, score) in self.iter().skip(1) {
            if score > best.1 {
                best = (emotion, score);
            }
        }
        best
    }
}

impl From<BTreeMap<String, f64>> for EmotionVector {
    fn from(map: BTreeMap<String, f64>) -> Self {
        let mut vector = Self::zeros();
        for (name, score) in map {
            match name.parse::<Emotion>() {
                Ok(emotion) => vector.set(emotion, score),
                Err(_) => tracing::debug!(name = %name, "Ignoring unknown emotion name"),
            }
        }
        vector
    }
}

impl From<EmotionVector> for BTreeMap<String, f64> {
    fn from(vector: EmotionVector) -> Self {
        vector
            .iter()
            .map(|(emotion, score)| (emotion.name().to_string(), score))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_sizes() {
        assert_eq!(Emotion::POSITIVE.len(), 11);
        assert_eq!(Emotion::NEGATIVE.len(), 11);
        assert_eq!(Emotion::OTHER.len(), 6);
        assert_eq!(
            Emotion::POSITIVE.len() + Emotion::NEGATIVE.len() + Emotion::OTHER.len(),
            EMOTION_COUNT
        );
    }

    #[test]
    fn test_partition_is_disjoint_and_complete() {
        for emotion in Emotion::ALL {
            let groups = [
                Emotion::POSITIVE.contains(&emotion),
                Emotion::NEGATIVE.contains(&emotion),
                Emotion::OTHER.contains(&emotion),
            ];
            assert_eq!(
                groups.iter().filter(|&&g| g).count(),
                1,
                "{} must belong to exactly one group",
                emotion
            );
        }
    }

    #[test]
    fn test_index_matches_all_order() {
        for (i, emotion) in Emotion::ALL.iter().enumerate() {
            assert_eq!(emotion.index(), i);
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("joy".parse::<Emotion>().unwrap(), Emotion::Joy);
        assert_eq!(" Sadness ".parse::<Emotion>().unwrap(), Emotion::Sadness);
        assert!("schadenfreude".parse::<Emotion>().is_err());
        for emotion in Emotion::ALL {
            assert_eq!(emotion.name().parse::<Emotion>().unwrap(), emotion);
        }
    }

    #[test]
    fn test_vector_from_map_defaults_missing_to_zero() {
        let mut map = BTreeMap::new();
        map.insert("joy".to_string(), 0.8);
        map.insert("fear".to_string(), 0.3);
        map.insert("not_an_emotion".to_string(), 0.9);

        let vector = EmotionVector::from(map);
        assert_eq!(vector.get(Emotion::Joy), 0.8);
        assert_eq!(vector.get(Emotion::Fear), 0.3);
        assert_eq!(vector.get(Emotion::Love), 0.0);
        assert_eq!(vector.iter().filter(|(_, s)| *s > 0.0).count(), 2);
    }

    #[test]
    fn test_vector_json_shape() {
        let json = r#"{"joy": 0.5, "anger": 0.25}"#;
        let vector: EmotionVector = serde_json::from_str(json).unwrap();
        assert_eq!(vector.get(Emotion::Joy), 0.5);
        assert_eq!(vector.get(Emotion::Anger), 0.25);

        let value = serde_json::to_value(vector).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), EMOTION_COUNT);
        assert_eq!(object["joy"], 0.5);
        assert_eq!(object["neutral"], 0.0);
    }

    #[test]
    fn test_polarity_max_prefers_taxonomy_order_on_ties() {
        let vector = EmotionVector::from_pairs([(Emotion::Love, 0.4), (Emotion::Joy, 0.4)]);
        assert_eq!(vector.polarity_max(Polarity::Positive), (Emotion::Joy, 0.4));
    }

    #[test]
    fn test_polarity_mean() {
        let vector = EmotionVector::from_pairs(Emotion::NEGATIVE.iter().map(|&e| (e, 0.5)));
        assert!((vector.polarity_mean(Polarity::Negative) - 0.5).abs() < 1e-12);
        assert_eq!(vector.polarity_mean(Polarity::Positive), 0.0);
    }

    #[test]
    fn test_dominant_over_all_categories() {
        let vector = EmotionVector::from_pairs([(Emotion::Neutral, 0.9), (Emotion::Joy, 0.2)]);
        assert_eq!(vector.dominant(), (Emotion::Neutral, 0.9));
    }
}
