//! Read-only data sources
//!
//! The analysis engine never talks to persistence directly. Callers hand it a
//! [`EmotionSource`] / [`TranscriptSource`]; a missing track comes back as
//! `None` ("no data") so the engine can degrade instead of failing.
//!
//! [`Corpus`] is the in-memory implementation, loaded from a JSON export with
//! three flat tables:
//!
//! ```json
//! {
//!   "entities": [{"entity_id": "m1", "title": "...", "outcomes": {"rating": 7.1}}],
//!   "emotion_records": [{"entity_id": "m1", "language": "en", "minute_offset": 0,
//!                        "scores": {"joy": 0.4}}],
//!   "dialogue": [{"entity_id": "m1", "language": "en", "start_seconds": 3.5,
//!                 "end_seconds": 6.0, "text": "..."}]
//! }
//! ```

use crate::models::{DialogueLine, EmotionRecord, EntitySummary};
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

/// Source of per-minute emotion records
pub trait EmotionSource {
    /// All known entities, in stable order
    fn entities(&self) -> Vec<EntitySummary>;

    /// Languages with emotion records for an entity
    fn languages(&self, entity_id: &str) -> Vec<String>;

    /// Records for one track sorted by minute offset, `None` if the track is unknown
    fn emotion_records(&self, entity_id: &str, language: &str) -> Option<&[EmotionRecord]>;
}

/// Source of time-stamped dialogue lines
pub trait TranscriptSource {
    /// Dialogue for one track sorted by start time, `None` if no transcript exists
    fn dialogue(&self, entity_id: &str, language: &str) -> Option<&[DialogueLine]>;
}

type TrackKey = (String, String);

#[derive(Debug, Default, Deserialize)]
struct CorpusFile {
    #[serde(default)]
    entities: Vec<EntitySummary>,
    #[serde(default)]
    emotion_records: Vec<EmotionRecord>,
    #[serde(default)]
    dialogue: Vec<DialogueLine>,
}

/// In-memory corpus indexed by (entity, language)
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    entities: BTreeMap<String, EntitySummary>,
    emotions: BTreeMap<TrackKey, Vec<EmotionRecord>>,
    dialogue: BTreeMap<TrackKey, Vec<DialogueLine>>,
}

impl Corpus {
    /// Build a corpus from raw tables
    ///
    /// Entities referenced only by records get an empty summary. Fails if a
    /// (entity, language, minute) appears twice.
    pub fn from_parts(
        entities: Vec<EntitySummary>,
        emotion_records: Vec<EmotionRecord>,
        dialogue: Vec<DialogueLine>,
    ) -> Result<Self> {
        let mut corpus = Corpus::default();

        for entity in entities {
            corpus.entities.insert(entity.entity_id.clone(), entity);
        }

        for record in emotion_records {
            corpus
                .entities
                .entry(record.entity_id.clone())
                .or_insert_with(|| EntitySummary::new(record.entity_id.clone()));
            corpus
                .emotions
                .entry((record.entity_id.clone(), record.language.clone()))
                .or_default()
                .push(record);
        }

        for ((entity_id, language), records) in corpus.emotions.iter_mut() {
            records.sort_by_key(|r| r.minute_offset);
            let mut seen = BTreeSet::new();
            for record in records.iter() {
                if !seen.insert(record.minute_offset) {
                    return Err(Error::InvalidInput(format!(
                        "Duplicate minute offset {} for entity '{}' language '{}'",
                        record.minute_offset, entity_id, language
                    )));
                }
            }
        }

        for line in dialogue {
            corpus
                .dialogue
                .entry((line.entity_id.clone(), line.language.clone()))
                .or_default()
                .push(line);
        }
        for lines in corpus.dialogue.values_mut() {
            lines.sort_by(|a, b| a.start_seconds.total_cmp(&b.start_seconds));
        }

        debug!(
            entities = corpus.entities.len(),
            emotion_tracks = corpus.emotions.len(),
            dialogue_tracks = corpus.dialogue.len(),
            "Corpus indexed"
        );

        Ok(corpus)
    }

    /// Parse a corpus from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: CorpusFile = serde_json::from_str(json)?;
        Self::from_parts(file.entities, file.emotion_records, file.dialogue)
    }

    /// Load a corpus from a JSON file on disk
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let corpus = Self::from_json_str(&content)?;
        info!(
            path = %path.display(),
            entities = corpus.entities.len(),
            "Loaded corpus"
        );
        Ok(corpus)
    }

    pub fn entity(&self, entity_id: &str) -> Option<&EntitySummary> {
        self.entities.get(entity_id)
    }
}

impl EmotionSource for Corpus {
    fn entities(&self) -> Vec<EntitySummary> {
        self.entities.values().cloned().collect()
    }

    fn languages(&self, entity_id: &str) -> Vec<String> {
        self.emotions
            .keys()
            .filter(|(entity, _)| entity == entity_id)
            .map(|(_, language)| language.clone())
            .collect()
    }

    fn emotion_records(&self, entity_id: &str, language: &str) -> Option<&[EmotionRecord]> {
        self.emotions
            .get(&(entity_id.to_string(), language.to_string()))
            .map(Vec::as_slice)
    }
}

impl TranscriptSource for Corpus {
    fn dialogue(&self, entity_id: &str, language: &str) -> Option<&[DialogueLine]> {
        self.dialogue
            .get(&(entity_id.to_string(), language.to_string()))
            .map(Vec::as_slice)
    }
}
