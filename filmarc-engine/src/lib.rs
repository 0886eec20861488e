//! # filmarc Analysis Engine
//!
//! Emotional-arc analytics over per-minute emotion annotations:
//! - Compound sentiment scoring ([`scoring`])
//! - Peak and valley detection ([`peaks`]) with dialogue evidence ([`evidence`])
//! - Cross-language arc alignment and divergence ([`alignment`])
//! - Metric correlation with significance testing ([`correlation`], [`metrics`])
//! - Entity-to-entity emotional similarity ([`similarity`])
//!
//! All components are synchronous and stateless. Data comes in through the
//! [`filmarc_common::EmotionSource`] and [`filmarc_common::TranscriptSource`]
//! traits; [`service::AnalysisService`] wires them to the components.

pub mod alignment;
pub mod config;
pub mod correlation;
pub mod evidence;
pub mod metrics;
pub mod peaks;
pub mod scoring;
pub mod service;
pub mod similarity;

pub use alignment::{ArcAligner, ArcComparison, LanguageSeries};
pub use config::{AnalysisConfig, LoggingConfig, TomlConfig};
pub use correlation::{CorrelationResult, MetricCorrelator};
pub use evidence::{DialogueExcerpt, EvidenceLinker};
pub use metrics::{EntityMetric, MetricExtractor};
pub use peaks::{Peak, PeakDetector, PeakSet};
pub use scoring::{CompoundScorer, CompoundStrategy, ScoredMinute};
pub use service::{AnalysisService, PeakReport, SimilarityReport};
pub use similarity::{EmotionFingerprint, FingerprintMode, SimilarityBatch, SimilarityEngine};
