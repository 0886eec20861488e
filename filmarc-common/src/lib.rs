//! # filmarc Common Library
//!
//! Shared code for the filmarc analysis crates:
//! - Emotion taxonomy (28 named emotions, polarity partition)
//! - Data model for per-minute emotion records and dialogue lines
//! - Store traits and the in-memory JSON corpus
//! - Error taxonomy
//! - Configuration file resolution

pub mod config;
pub mod emotions;
pub mod error;
pub mod models;
pub mod store;

pub use emotions::{Emotion, EmotionVector, Polarity};
pub use error::{Error, ErrorKind, Result};
pub use models::{DialogueLine, EmotionRecord, EntitySummary, MetricSample};
pub use store::{Corpus, EmotionSource, TranscriptSource};
