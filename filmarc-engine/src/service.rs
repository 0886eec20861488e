//! Analysis service
//!
//! Binds the data sources and the [`AnalysisConfig`] to the analysis
//! components and exposes the operations downstream callers use. Each call
//! retrieves what it needs, recomputes from scratch and returns a
//! serializable report. Nothing is cached between calls.

use crate::alignment::{ArcAligner, ArcComparison, LanguageSeries};
use crate::config::AnalysisConfig;
use crate::correlation::{CorrelationResult, MetricCorrelator};
use crate::evidence::{EvidenceLinker, ExcerptMap};
use crate::metrics::{EntityMetric, MetricExtractor};
use crate::peaks::{PeakDetector, PeakSet};
use crate::scoring::{rolling_mean, CompoundScorer, CompoundStrategy, ScoredMinute};
use crate::similarity::{
    EmotionFingerprint, FingerprintMode, RankedEntity, SimilarityBatch, SimilarityEngine,
};
use filmarc_common::{EmotionSource, Error, Result, TranscriptSource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Peaks of one track with their dialogue evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakReport {
    pub entity_id: String,
    pub language: String,
    /// False when the track has no emotion records
    pub data_available: bool,
    pub strategy: CompoundStrategy,
    pub smoothing_window: usize,
    pub peaks: PeakSet,
    /// Excerpts for every peak minute; empty without a transcript
    pub evidence: ExcerptMap,
}

/// Similarity batch for one language, optionally ranked around a target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityReport {
    pub language: String,
    pub mode: FingerprintMode,
    pub fingerprints: Vec<EmotionFingerprint>,
    /// Entities with no records in this language (degenerate fingerprints)
    pub entities_without_data: Vec<String>,
    pub batch: SimilarityBatch,
    pub target: Option<String>,
    pub ranking: Vec<RankedEntity>,
}

/// Analysis service over borrowed data sources
#[derive(Clone, Copy)]
pub struct AnalysisService<'a> {
    emotions: &'a dyn EmotionSource,
    transcripts: &'a dyn TranscriptSource,
    scorer: CompoundScorer,
    detector: PeakDetector,
    linker: EvidenceLinker,
    aligner: ArcAligner,
    correlator: MetricCorrelator,
    similarity: SimilarityEngine,
    smoothing_window: usize,
}

impl<'a> AnalysisService<'a> {
    /// Build the components from a validated configuration
    pub fn new(
        emotions: &'a dyn EmotionSource,
        transcripts: &'a dyn TranscriptSource,
        config: &AnalysisConfig,
    ) -> Result<Self> {
        config.validate()?;

        let linker = EvidenceLinker::new()
            .with_max_excerpts(config.excerpts_per_minute)?
            .with_max_chars(config.excerpt_max_chars)?;

        Ok(Self {
            emotions,
            transcripts,
            scorer: CompoundScorer::new(config.compound_strategy),
            detector: PeakDetector::new()
                .with_k(config.peak_count)?
                .with_threshold(config.peak_threshold)?,
            linker,
            aligner: ArcAligner::new()
                .with_divergence_k(config.divergence_count)?
                .with_evidence_linker(linker),
            correlator: MetricCorrelator::new().with_alpha(config.significance_alpha)?,
            similarity: SimilarityEngine::new(config.fingerprint_mode),
            smoothing_window: config.smoothing_window,
        })
    }

    /// Scored (and optionally smoothed) series of one track
    fn series(&self, entity_id: &str, language: &str) -> Option<Vec<ScoredMinute>> {
        self.emotions
            .emotion_records(entity_id, language)
            .map(|records| self.scorer.score_series(records))
    }

    /// Top peaks and valleys of one track, with dialogue for each
    pub fn peaks(&self, entity_id: &str, language: &str) -> Result<PeakReport> {
        let (data_available, peaks) = match self.series(entity_id, language) {
            Some(series) if !series.is_empty() => {
                let series = rolling_mean(&series, self.smoothing_window)?;
                (true, self.detector.identify_peaks(&series))
            }
            _ => {
                warn!(entity_id, language, "No emotion records for track");
                (false, PeakSet::default())
            }
        };

        let evidence = if peaks.is_empty() {
            ExcerptMap::new()
        } else {
            self.linker.excerpts(
                self.transcripts,
                entity_id,
                language,
                &peaks.minute_offsets(),
            )
        };

        info!(
            entity_id,
            language,
            data_available,
            positive = peaks.positive.len(),
            negative = peaks.negative.len(),
            "Peak analysis complete"
        );

        Ok(PeakReport {
            entity_id: entity_id.to_string(),
            language: language.to_string(),
            data_available,
            strategy: self.scorer.strategy(),
            smoothing_window: self.smoothing_window,
            peaks,
            evidence,
        })
    }

    /// Cross-language comparison of one entity
    ///
    /// An empty language list means every language the entity has records
    /// for. The list is validated before any track is retrieved. A language
    /// without records takes part as an empty track and is reported in
    /// `languages_without_data`.
    pub fn compare_languages(&self, entity_id: &str, languages: &[String]) -> Result<ArcComparison> {
        let languages = if languages.is_empty() {
            self.emotions.languages(entity_id)
        } else {
            languages.to_vec()
        };

        if languages.len() < 2 {
            return Err(Error::InsufficientLanguages {
                supplied: languages.len(),
            });
        }
        let mut seen = BTreeSet::new();
        if let Some(repeated) = languages.iter().find(|&l| !seen.insert(l.as_str())) {
            return Err(Error::InvalidInput(format!(
                "Language '{}' requested more than once",
                repeated
            )));
        }

        let series: Vec<LanguageSeries> = languages
            .iter()
            .map(|language| {
                let points = self.series(entity_id, language).unwrap_or_else(|| {
                    warn!(entity_id, language = %language, "No emotion records for track");
                    Vec::new()
                });
                LanguageSeries::new(language.clone(), points)
            })
            .collect();

        self.aligner.compare(entity_id, &series, Some(self.transcripts))
    }

    /// Correlate two named entity metrics across every entity
    ///
    /// Sentiment metrics read the records of `language`.
    pub fn correlate_metrics(
        &self,
        metric_x: &str,
        metric_y: &str,
        language: &str,
    ) -> Result<CorrelationResult> {
        if metric_x.trim() == metric_y.trim() {
            return Err(Error::IdenticalMetrics(metric_x.trim().to_string()));
        }
        let x: EntityMetric = metric_x.parse()?;
        let y: EntityMetric = metric_y.parse()?;

        let samples = MetricExtractor::new(self.emotions, self.scorer).samples(&x, &y, language);
        self.correlator
            .correlate(&x.to_string(), &y.to_string(), &samples)
    }

    /// Emotional similarity between all entities in one language
    ///
    /// With a target, the batch is also ranked around it (top `top_n`).
    pub fn similarity(
        &self,
        language: &str,
        target: Option<&str>,
        top_n: usize,
    ) -> Result<SimilarityReport> {
        if top_n == 0 {
            return Err(Error::InvalidInput("top_n must be >= 1".to_string()));
        }

        let entities = self.emotions.entities();
        if let Some(target) = target {
            if !entities.iter().any(|e| e.entity_id == target) {
                return Err(Error::InvalidInput(format!("Unknown entity: {}", target)));
            }
        }

        let mut entities_without_data = Vec::new();
        let fingerprints: Vec<EmotionFingerprint> = entities
            .iter()
            .map(|entity| {
                let records = self
                    .emotions
                    .emotion_records(&entity.entity_id, language)
                    .unwrap_or_default();
                if records.is_empty() {
                    entities_without_data.push(entity.entity_id.clone());
                }
                self.similarity.vectorize(&entity.entity_id, records)
            })
            .collect();

        let batch = self.similarity.compare_batch(&fingerprints);
        let ranking = target
            .map(|t| batch.rank_against(t, top_n))
            .unwrap_or_default();

        info!(
            language,
            entities = fingerprints.len(),
            without_data = entities_without_data.len(),
            target = target.unwrap_or("-"),
            "Similarity analysis complete"
        );

        Ok(SimilarityReport {
            language: language.to_string(),
            mode: self.similarity.mode(),
            fingerprints,
            entities_without_data,
            batch,
            target: target.map(str::to_string),
            ranking,
        })
    }

    /// Dialogue excerpts for arbitrary minutes of one track
    pub fn evidence(&self, entity_id: &str, language: &str, minute_offsets: &[u32]) -> ExcerptMap {
        self.linker
            .excerpts(self.transcripts, entity_id, language, minute_offsets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filmarc_common::{Corpus, Emotion, EmotionRecord, EmotionVector, EntitySummary, ErrorKind};

    fn corpus() -> Corpus {
        let joy = |v| EmotionVector::from_pairs([(Emotion::Joy, v)]);
        Corpus::from_parts(
            vec![EntitySummary::new("m1"), EntitySummary::new("m2")],
            vec![
                EmotionRecord::new("m1", "en", 0, joy(0.1)),
                EmotionRecord::new("m1", "en", 1, joy(0.5)),
                EmotionRecord::new("m1", "fr", 0, joy(0.2)),
            ],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let corpus = corpus();
        let config = AnalysisConfig {
            peak_count: 0,
            ..AnalysisConfig::default()
        };
        let err = AnalysisService::new(&corpus, &corpus, &config).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_peaks_without_data() {
        let corpus = corpus();
        let service = AnalysisService::new(&corpus, &corpus, &AnalysisConfig::default()).unwrap();
        let report = service.peaks("m2", "en").unwrap();
        assert!(!report.data_available);
        assert!(report.peaks.is_empty());
        assert!(report.evidence.is_empty());
    }

    #[test]
    fn test_compare_needs_two_languages_before_lookup() {
        let corpus = corpus();
        let service = AnalysisService::new(&corpus, &corpus, &AnalysisConfig::default()).unwrap();
        let err = service
            .compare_languages("unknown", &["en".to_string()])
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientLanguages { supplied: 1 }));
    }

    #[test]
    fn test_compare_rejects_repeated_language() {
        let corpus = corpus();
        let service = AnalysisService::new(&corpus, &corpus, &AnalysisConfig::default()).unwrap();
        let languages = vec!["en".to_string(), "fr".to_string(), "en".to_string()];
        let err = service.compare_languages("m1", &languages).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(ref msg) if msg.contains("'en'")));
    }

    #[test]
    fn test_compare_defaults_to_recorded_languages() {
        let corpus = corpus();
        let service = AnalysisService::new(&corpus, &corpus, &AnalysisConfig::default()).unwrap();

        let comparison = service.compare_languages("m1", &[]).unwrap();
        assert_eq!(comparison.aligned.languages(), vec!["en", "fr"]);

        // m2 has no records in any language
        let err = service.compare_languages("m2", &[]).unwrap_err();
        assert!(matches!(err, Error::InsufficientLanguages { supplied: 0 }));
    }

    #[test]
    fn test_identical_metrics_fail_before_parsing() {
        let corpus = corpus();
        let service = AnalysisService::new(&corpus, &corpus, &AnalysisConfig::default()).unwrap();
        let err = service.correlate_metrics("bogus", "bogus", "en").unwrap_err();
        assert!(matches!(err, Error::IdenticalMetrics(_)));
        let err = service.correlate_metrics("bogus", "mean_compound", "en").unwrap_err();
        assert!(matches!(err, Error::UnknownMetric(_)));
    }

    #[test]
    fn test_similarity_validation() {
        let corpus = corpus();
        let service = AnalysisService::new(&corpus, &corpus, &AnalysisConfig::default()).unwrap();
        assert_eq!(
            service.similarity("en", None, 0).unwrap_err().kind(),
            ErrorKind::InputValidation
        );
        assert_eq!(
            service.similarity("en", Some("m9"), 3).unwrap_err().kind(),
            ErrorKind::InputValidation
        );
        let report = service.similarity("en", Some("m1"), 3).unwrap();
        assert_eq!(report.entities_without_data, vec!["m2".to_string()]);
        assert_eq!(report.ranking.len(), 1);
        assert_eq!(report.ranking[0].similarity, None);
    }
}
