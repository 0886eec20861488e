//! Cross-language arc alignment
//!
//! Puts the compound series of several language tracks of one entity on a
//! shared minute axis, then measures how similar the tracks are (pairwise
//! Pearson r) and where they disagree most (cross-language variance).
//!
//! # Limitation
//! Alignment is by minute bucket only. Dubs and subtitles differ in pacing,
//! so minute N of one track is not guaranteed to be the same scene as minute
//! N of another. Every comparison report carries [`MINUTE_BUCKET_CAVEAT`];
//! no re-alignment heuristic is applied.
//!
//! # Missing data
//! A language with no record at some minute holds `None` there, never 0.0
//! (0.0 is a valid neutral score). Pairs with fewer than 2 shared minutes get
//! no correlation entry.

use crate::correlation::pearson;
use crate::evidence::{DialogueExcerpt, EvidenceLinker};
use crate::scoring::ScoredMinute;
use filmarc_common::{Error, Result, TranscriptSource};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Caveat attached to every cross-language comparison
pub const MINUTE_BUCKET_CAVEAT: &str = "Language tracks are aligned by minute bucket, not by scene. \
Dubbed and subtitled tracks differ in pacing, so a divergence may reflect timing drift \
rather than a different emotional reading.";

/// Minimum shared minutes for a pairwise correlation
pub const MIN_OVERLAP: usize = 2;

/// Scored series of one language track
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageSeries {
    pub language: String,
    pub series: Vec<ScoredMinute>,
}

impl LanguageSeries {
    pub fn new(language: impl Into<String>, series: Vec<ScoredMinute>) -> Self {
        Self {
            language: language.into(),
            series,
        }
    }
}

/// One language's scores over the shared axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageArc {
    pub language: String,
    /// Index-aligned with [`AlignedArcs::minute_offsets`]; `None` = no data
    pub scores: Vec<Option<f64>>,
}

impl LanguageArc {
    pub fn point_count(&self) -> usize {
        self.scores.iter().filter(|s| s.is_some()).count()
    }
}

/// All requested languages on one minute axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedArcs {
    /// Sorted union of every language's minute offsets
    pub minute_offsets: Vec<u32>,
    /// In the order the languages were requested
    pub arcs: Vec<LanguageArc>,
}

impl AlignedArcs {
    pub fn len(&self) -> usize {
        self.minute_offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.minute_offsets.is_empty()
    }

    pub fn languages(&self) -> Vec<&str> {
        self.arcs.iter().map(|a| a.language.as_str()).collect()
    }

    pub fn arc(&self, language: &str) -> Option<&LanguageArc> {
        self.arcs.iter().find(|a| a.language == language)
    }

    /// Languages with no point on the axis
    pub fn languages_without_data(&self) -> Vec<String> {
        self.arcs
            .iter()
            .filter(|a| a.point_count() == 0)
            .map(|a| a.language.clone())
            .collect()
    }
}

/// Pearson r between two language tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationEntry {
    pub language_a: String,
    pub language_b: String,
    pub r: f64,
    /// Minutes where both languages have a score
    pub overlap: usize,
}

/// Why a language pair has no correlation entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InsufficientOverlap,
    ZeroVariance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedPair {
    pub language_a: String,
    pub language_b: String,
    pub overlap: usize,
    pub reason: SkipReason,
}

/// Pairwise correlations between language tracks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    /// Pairs in language order (a before b)
    pub entries: Vec<CorrelationEntry>,
    pub skipped: Vec<SkippedPair>,
}

impl CorrelationMatrix {
    /// r for a pair, in either order
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| {
                (e.language_a == a && e.language_b == b) || (e.language_a == b && e.language_b == a)
            })
            .map(|e| e.r)
    }

    /// Highest r; on ties the earliest pair in language order
    pub fn most_similar(&self) -> Option<&CorrelationEntry> {
        let mut best: Option<&CorrelationEntry> = None;
        for entry in &self.entries {
            if best.map_or(true, |b| entry.r > b.r) {
                best = Some(entry);
            }
        }
        best
    }

    /// Lowest r; on ties the earliest pair in language order
    pub fn most_divergent(&self) -> Option<&CorrelationEntry> {
        let mut worst: Option<&CorrelationEntry> = None;
        for entry in &self.entries {
            if worst.map_or(true, |w| entry.r < w.r) {
                worst = Some(entry);
            }
        }
        worst
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageScore {
    pub language: String,
    pub score: f64,
}

/// Minute where the language tracks disagree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivergencePoint {
    pub minute_offset: u32,
    /// Sample variance (n − 1) across the languages present at this minute
    pub variance: f64,
    pub scores: Vec<LanguageScore>,
}

/// Dialogue behind one divergence point, per language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivergenceEvidence {
    pub minute_offset: u32,
    pub excerpts: BTreeMap<String, Vec<DialogueExcerpt>>,
}

/// Full cross-language comparison of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcComparison {
    pub entity_id: String,
    pub aligned: AlignedArcs,
    pub correlations: CorrelationMatrix,
    pub most_similar: Option<CorrelationEntry>,
    pub most_divergent: Option<CorrelationEntry>,
    pub divergence_points: Vec<DivergencePoint>,
    /// Empty when no transcript source was supplied
    pub evidence: Vec<DivergenceEvidence>,
    pub languages_without_data: Vec<String>,
    pub caveat: String,
}

/// Arc aligner
#[derive(Debug, Clone, Copy)]
pub struct ArcAligner {
    /// Divergence points reported by [`ArcAligner::compare`] (default: 3)
    divergence_k: usize,
    evidence: EvidenceLinker,
}

impl ArcAligner {
    pub fn new() -> Self {
        Self {
            divergence_k: 3,
            evidence: EvidenceLinker::new(),
        }
    }

    pub fn with_divergence_k(mut self, k: usize) -> Result<Self> {
        if k == 0 {
            return Err(Error::InvalidInput(
                "Divergence point count must be >= 1".to_string(),
            ));
        }
        self.divergence_k = k;
        Ok(self)
    }

    pub fn with_evidence_linker(mut self, evidence: EvidenceLinker) -> Self {
        self.evidence = evidence;
        self
    }

    /// Build per-language score arrays over the union of minute offsets
    ///
    /// # Errors
    /// - `InsufficientLanguages` for fewer than 2 languages
    /// - `InvalidInput` for a repeated language or a repeated minute within one language
    pub fn align(series_by_language: &[LanguageSeries]) -> Result<AlignedArcs> {
        if series_by_language.len() < 2 {
            return Err(Error::InsufficientLanguages {
                supplied: series_by_language.len(),
            });
        }

        let mut seen_languages = BTreeSet::new();
        let mut lookups: Vec<BTreeMap<u32, f64>> = Vec::with_capacity(series_by_language.len());
        for entry in series_by_language {
            if !seen_languages.insert(entry.language.as_str()) {
                return Err(Error::InvalidInput(format!(
                    "Language '{}' requested more than once",
                    entry.language
                )));
            }
            let mut lookup = BTreeMap::new();
            for minute in &entry.series {
                if lookup.insert(minute.minute_offset, minute.compound).is_some() {
                    return Err(Error::InvalidInput(format!(
                        "Minute {} appears twice in language '{}'",
                        minute.minute_offset, entry.language
                    )));
                }
            }
            lookups.push(lookup);
        }

        let axis: BTreeSet<u32> = lookups.iter().flat_map(|l| l.keys().copied()).collect();
        let minute_offsets: Vec<u32> = axis.into_iter().collect();

        let arcs = series_by_language
            .iter()
            .zip(lookups.iter())
            .map(|(entry, lookup)| LanguageArc {
                language: entry.language.clone(),
                scores: minute_offsets.iter().map(|m| lookup.get(m).copied()).collect(),
            })
            .collect();

        let aligned = AlignedArcs {
            minute_offsets,
            arcs,
        };

        for language in aligned.languages_without_data() {
            warn!(language = %language, "Language has no scored minutes");
        }
        debug!(
            languages = aligned.arcs.len(),
            minutes = aligned.len(),
            "Aligned language arcs"
        );

        Ok(aligned)
    }

    /// Pearson r for every unordered language pair over shared minutes
    pub fn correlate(aligned: &AlignedArcs) -> CorrelationMatrix {
        let mut matrix = CorrelationMatrix::default();

        for (i, arc_a) in aligned.arcs.iter().enumerate() {
            for arc_b in &aligned.arcs[i + 1..] {
                let (xs, ys): (Vec<f64>, Vec<f64>) = arc_a
                    .scores
                    .iter()
                    .zip(arc_b.scores.iter())
                    .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
                    .unzip();
                let overlap = xs.len();

                let skip = |reason| SkippedPair {
                    language_a: arc_a.language.clone(),
                    language_b: arc_b.language.clone(),
                    overlap,
                    reason,
                };

                if overlap < MIN_OVERLAP {
                    matrix.skipped.push(skip(SkipReason::InsufficientOverlap));
                    continue;
                }

                match pearson(&xs, &ys) {
                    Some(r) => matrix.entries.push(CorrelationEntry {
                        language_a: arc_a.language.clone(),
                        language_b: arc_b.language.clone(),
                        r,
                        overlap,
                    }),
                    None => matrix.skipped.push(skip(SkipReason::ZeroVariance)),
                }
            }
        }

        matrix
    }

    /// Top-k minutes by cross-language sample variance
    ///
    /// Only minutes with at least two languages present are considered.
    /// Equal variances keep minute order.
    pub fn diverge(aligned: &AlignedArcs, k: usize) -> Vec<DivergencePoint> {
        let mut points: Vec<DivergencePoint> = aligned
            .minute_offsets
            .iter()
            .enumerate()
            .filter_map(|(idx, &minute_offset)| {
                let scores: Vec<LanguageScore> = aligned
                    .arcs
                    .iter()
                    .filter_map(|arc| {
                        arc.scores[idx].map(|score| LanguageScore {
                            language: arc.language.clone(),
                            score,
                        })
                    })
                    .collect();
                if scores.len() < 2 {
                    return None;
                }
                let values: Vec<f64> = scores.iter().map(|s| s.score).collect();
                Some(DivergencePoint {
                    minute_offset,
                    variance: sample_variance(&values),
                    scores,
                })
            })
            .collect();

        points.sort_by(|a, b| b.variance.total_cmp(&a.variance));
        points.truncate(k);
        points
    }

    /// Align, correlate and find divergence points in one pass
    ///
    /// With a transcript source, each divergence point gets dialogue
    /// excerpts for every language that has a transcript.
    pub fn compare(
        &self,
        entity_id: &str,
        series_by_language: &[LanguageSeries],
        transcripts: Option<&dyn TranscriptSource>,
    ) -> Result<ArcComparison> {
        let aligned = Self::align(series_by_language)?;
        let correlations = Self::correlate(&aligned);
        let divergence_points = Self::diverge(&aligned, self.divergence_k);

        let evidence = match transcripts {
            Some(source) => divergence_points
                .iter()
                .map(|point| self.divergence_evidence(source, entity_id, point))
                .collect(),
            None => Vec::new(),
        };

        let most_similar = correlations.most_similar().cloned();
        let most_divergent = correlations.most_divergent().cloned();

        info!(
            entity_id,
            languages = aligned.arcs.len(),
            pairs = correlations.entries.len(),
            skipped_pairs = correlations.skipped.len(),
            divergence_points = divergence_points.len(),
            "Compared language arcs"
        );

        Ok(ArcComparison {
            entity_id: entity_id.to_string(),
            languages_without_data: aligned.languages_without_data(),
            aligned,
            correlations,
            most_similar,
            most_divergent,
            divergence_points,
            evidence,
            caveat: MINUTE_BUCKET_CAVEAT.to_string(),
        })
    }

    fn divergence_evidence(
        &self,
        source: &dyn TranscriptSource,
        entity_id: &str,
        point: &DivergencePoint,
    ) -> DivergenceEvidence {
        let mut excerpts = BTreeMap::new();
        for language_score in &point.scores {
            let mut by_minute = self.evidence.excerpts(
                source,
                entity_id,
                &language_score.language,
                &[point.minute_offset],
            );
            if let Some(lines) = by_minute.remove(&point.minute_offset) {
                excerpts.insert(language_score.language.clone(), lines);
            }
        }
        DivergenceEvidence {
            minute_offset: point.minute_offset,
            excerpts,
        }
    }
}

impl Default for ArcAligner {
    fn default() -> Self {
        Self::new()
    }
}

fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filmarc_common::{DialogueLine, EmotionVector, ErrorKind};

    fn lang(language: &str, points: &[(u32, f64)]) -> LanguageSeries {
        LanguageSeries::new(
            language,
            points
                .iter()
                .map(|&(m, c)| ScoredMinute::new(m, c, EmotionVector::zeros()))
                .collect(),
        )
    }

    fn three_languages() -> Vec<LanguageSeries> {
        vec![
            lang("en", &[(0, 0.1), (1, 0.5), (2, 0.9)]),
            lang("fr", &[(0, 0.1), (1, 0.5), (2, 0.9)]),
            lang("es", &[(0, -0.1), (1, -0.5), (2, -0.9)]),
        ]
    }

    #[test]
    fn test_align_union_axis_equal_lengths() {
        let series = vec![
            lang("en", &[(0, 0.1), (2, 0.3)]),
            lang("fr", &[(1, 0.2), (2, 0.4), (5, 0.0)]),
        ];
        let aligned = ArcAligner::align(&series).unwrap();

        assert_eq!(aligned.minute_offsets, vec![0, 1, 2, 5]);
        for arc in &aligned.arcs {
            assert_eq!(arc.scores.len(), aligned.len());
        }
        assert_eq!(aligned.arc("en").unwrap().scores, vec![Some(0.1), None, Some(0.3), None]);
        // 0.0 is a real score, not a missing point
        assert_eq!(aligned.arc("fr").unwrap().scores, vec![None, Some(0.2), Some(0.4), Some(0.0)]);
    }

    #[test]
    fn test_align_requires_two_languages() {
        let err = ArcAligner::align(&[lang("en", &[(0, 0.1)])]).unwrap_err();
        assert!(matches!(err, Error::InsufficientLanguages { supplied: 1 }));
        assert_eq!(err.kind(), ErrorKind::InputValidation);
        assert!(ArcAligner::align(&[]).is_err());
    }

    #[test]
    fn test_align_rejects_repeated_language() {
        let series = vec![lang("en", &[(0, 0.1)]), lang("en", &[(0, 0.2)])];
        assert!(matches!(ArcAligner::align(&series), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_identical_and_inverted_tracks() {
        let aligned = ArcAligner::align(&three_languages()).unwrap();
        let matrix = ArcAligner::correlate(&aligned);

        assert!((matrix.get("en", "fr").unwrap() - 1.0).abs() < 1e-9);
        assert!((matrix.get("en", "es").unwrap() + 1.0).abs() < 1e-9);
        assert!((matrix.get("es", "fr").unwrap() + 1.0).abs() < 1e-9);

        let similar = matrix.most_similar().unwrap();
        assert_eq!((similar.language_a.as_str(), similar.language_b.as_str()), ("en", "fr"));

        // en-es and fr-es tie at -1.0; the earlier pair in language order wins
        let divergent = matrix.most_divergent().unwrap();
        assert_eq!((divergent.language_a.as_str(), divergent.language_b.as_str()), ("en", "es"));
    }

    #[test]
    fn test_insufficient_overlap_pair_omitted() {
        let series = vec![
            lang("en", &[(0, 0.1), (1, 0.2), (2, 0.3)]),
            lang("fr", &[(0, 0.3), (1, 0.1), (2, 0.2)]),
            lang("de", &[(2, 0.5), (7, 0.1)]),
        ];
        let aligned = ArcAligner::align(&series).unwrap();
        let matrix = ArcAligner::correlate(&aligned);

        assert_eq!(matrix.entries.len(), 1);
        assert!(matrix.get("en", "de").is_none());
        assert_eq!(matrix.skipped.len(), 2);
        assert!(matrix
            .skipped
            .iter()
            .all(|s| s.reason == SkipReason::InsufficientOverlap && s.overlap == 1));
    }

    #[test]
    fn test_language_without_data_not_fatal() {
        let series = vec![
            lang("en", &[(0, 0.1), (1, 0.2)]),
            lang("fr", &[(0, 0.2), (1, 0.4)]),
            lang("ja", &[]),
        ];
        let comparison = ArcAligner::new().compare("m", &series, None).unwrap();
        assert_eq!(comparison.languages_without_data, vec!["ja".to_string()]);
        assert_eq!(comparison.correlations.entries.len(), 1);
        assert_eq!(comparison.aligned.arc("ja").unwrap().scores, vec![None, None]);
        assert_eq!(comparison.caveat, MINUTE_BUCKET_CAVEAT);
    }

    #[test]
    fn test_diverge_ranks_by_variance() {
        let aligned = ArcAligner::align(&three_languages()).unwrap();
        let points = ArcAligner::diverge(&aligned, 3);

        let minutes: Vec<u32> = points.iter().map(|p| p.minute_offset).collect();
        assert_eq!(minutes, vec![2, 1, 0]);
        // values 0.9, 0.9, -0.9: mean 0.3, sample variance = (0.36 + 0.36 + 1.44) / 2
        assert!((points[0].variance - 1.08).abs() < 1e-9);
        assert_eq!(points[0].scores.len(), 3);
    }

    #[test]
    fn test_diverge_needs_two_languages_per_minute() {
        let series = vec![
            lang("en", &[(0, 0.1), (1, 0.9)]),
            lang("fr", &[(0, -0.1), (3, 0.4)]),
        ];
        let aligned = ArcAligner::align(&series).unwrap();
        let points = ArcAligner::diverge(&aligned, 5);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].minute_offset, 0);
    }

    #[test]
    fn test_diverge_respects_k() {
        let aligned = ArcAligner::align(&three_languages()).unwrap();
        assert_eq!(ArcAligner::diverge(&aligned, 1).len(), 1);
    }

    #[test]
    fn test_zero_variance_pair_skipped() {
        let series = vec![
            lang("en", &[(0, 0.2), (1, 0.2), (2, 0.2)]),
            lang("fr", &[(0, 0.1), (1, 0.5), (2, 0.3)]),
        ];
        let aligned = ArcAligner::align(&series).unwrap();
        let matrix = ArcAligner::correlate(&aligned);
        assert!(matrix.entries.is_empty());
        assert_eq!(matrix.skipped[0].reason, SkipReason::ZeroVariance);
        assert!(matrix.most_similar().is_none());
    }

    struct Transcripts(Vec<DialogueLine>);

    impl TranscriptSource for Transcripts {
        fn dialogue(&self, _entity_id: &str, language: &str) -> Option<&[DialogueLine]> {
            if language == "en" {
                Some(&self.0)
            } else {
                None
            }
        }
    }

    #[test]
    fn test_compare_attaches_evidence() {
        let transcripts = Transcripts(vec![DialogueLine::new("m", "en", 125.0, 128.0, "We made it!")]);
        let comparison = ArcAligner::new()
            .compare("m", &three_languages(), Some(&transcripts))
            .unwrap();

        assert_eq!(comparison.evidence.len(), 3);
        let top = &comparison.evidence[0];
        assert_eq!(top.minute_offset, 2);
        assert_eq!(top.excerpts["en"][0].text, "We made it!");
        // No transcript for fr/es: no fabricated lines
        assert!(!top.excerpts.contains_key("fr"));

        let quiet = &comparison.evidence[1];
        assert!(quiet.excerpts["en"][0].placeholder);
    }
}
