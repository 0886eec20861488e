//! Metric correlation with significance
//!
//! Correlates two entity-level scalar metrics across the corpus (e.g. mean
//! compound sentiment vs. box office). Input is a list of already-extracted
//! (x, y) samples; which aggregate feeds each side is decided by the caller.
//!
//! # Statistics
//! - r: Pearson product-moment correlation
//! - p: two-sided Student t test of H0: ρ = 0,
//!   t = r·√((n−2)/(1−r²)) with n−2 degrees of freedom
//!
//! # Labels
//! Fixed conventions, not derived from the data:
//! - strength: |r| < 0.3 weak, |r| < 0.7 moderate, otherwise strong
//! - significance: p < α (α = 0.05 unless configured)

use filmarc_common::{Error, MetricSample, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::fmt;
use tracing::{debug, info};

/// Minimum number of complete samples for a correlation
pub const MIN_SAMPLES: usize = 2;

/// Default significance level
pub const DEFAULT_ALPHA: f64 = 0.05;

const WEAK_BELOW: f64 = 0.3;
const MODERATE_BELOW: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Weak,
    Moderate,
    Strong,
}

impl Strength {
    pub fn from_r(r: f64) -> Self {
        let magnitude = r.abs();
        if magnitude < WEAK_BELOW {
            Strength::Weak
        } else if magnitude < MODERATE_BELOW {
            Strength::Moderate
        } else {
            Strength::Strong
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Positive,
    Negative,
    None,
}

impl Direction {
    pub fn from_r(r: f64) -> Self {
        if r > 0.0 {
            Direction::Positive
        } else if r < 0.0 {
            Direction::Negative
        } else {
            Direction::None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    Significant,
    NotSignificant,
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strength::Weak => write!(f, "weak"),
            Strength::Moderate => write!(f, "moderate"),
            Strength::Strong => write!(f, "strong"),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Positive => write!(f, "positive"),
            Direction::Negative => write!(f, "negative"),
            Direction::None => write!(f, "none"),
        }
    }
}

impl fmt::Display for Significance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Significance::Significant => write!(f, "significant"),
            Significance::NotSignificant => write!(f, "not significant"),
        }
    }
}

/// Correlation between two metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub metric_x: String,
    pub metric_y: String,
    pub r: f64,
    pub p_value: f64,
    /// Samples used after pruning
    pub n: usize,
    /// Samples dropped for a missing value
    pub excluded: usize,
    pub strength: Strength,
    pub direction: Direction,
    pub significance: Significance,
}

/// Metric correlator
#[derive(Debug, Clone, Copy)]
pub struct MetricCorrelator {
    alpha: f64,
}

impl MetricCorrelator {
    pub fn new() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(Error::InvalidInput(format!(
                "Significance level must be in (0, 1), got {}",
                alpha
            )));
        }
        self.alpha = alpha;
        Ok(self)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Correlate metric X against metric Y over the given samples
    ///
    /// # Errors
    /// - `IdenticalMetrics` if both names match (checked first)
    /// - `InsufficientSamples` if fewer than 2 complete samples remain
    /// - `ZeroVariance` if either metric is constant across the samples
    pub fn correlate(
        &self,
        metric_x: &str,
        metric_y: &str,
        samples: &[MetricSample],
    ) -> Result<CorrelationResult> {
        if metric_x == metric_y {
            return Err(Error::IdenticalMetrics(metric_x.to_string()));
        }

        let (xs, ys): (Vec<f64>, Vec<f64>) = samples.iter().filter_map(MetricSample::pair).unzip();
        let n = xs.len();
        let excluded = samples.len() - n;

        if n < MIN_SAMPLES {
            return Err(Error::InsufficientSamples {
                usable: n,
                excluded,
                required: MIN_SAMPLES,
            });
        }
        if !has_spread(&xs) {
            return Err(Error::ZeroVariance {
                metric: metric_x.to_string(),
                n,
            });
        }
        if !has_spread(&ys) {
            return Err(Error::ZeroVariance {
                metric: metric_y.to_string(),
                n,
            });
        }

        let r = pearson(&xs, &ys).ok_or_else(|| Error::ZeroVariance {
            metric: format!("{} / {}", metric_x, metric_y),
            n,
        })?;
        let p_value = two_sided_p_value(r, n);

        let result = CorrelationResult {
            metric_x: metric_x.to_string(),
            metric_y: metric_y.to_string(),
            r,
            p_value,
            n,
            excluded,
            strength: Strength::from_r(r),
            direction: Direction::from_r(r),
            significance: if p_value < self.alpha {
                Significance::Significant
            } else {
                Significance::NotSignificant
            },
        };

        info!(
            metric_x,
            metric_y,
            r = result.r,
            p_value = result.p_value,
            n,
            excluded,
            "Correlated metrics"
        );

        Ok(result)
    }
}

impl Default for MetricCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

/// Pearson r of two equal-length series
///
/// `None` when fewer than 2 points or either series has no spread.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut den_x = 0.0;
    let mut den_y = 0.0;
    for (&x, &y) in xs.iter().zip(ys.iter()) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        num += dx * dy;
        den_x += dx * dx;
        den_y += dy * dy;
    }

    let den = (den_x * den_y).sqrt();
    if den > 0.0 && den.is_finite() {
        Some((num / den).clamp(-1.0, 1.0))
    } else {
        None
    }
}

/// Whether a series varies beyond rounding noise at its own scale
///
/// The cutoff scales with the squared mean; an exactly constant series
/// (including all zeros) never has spread.
fn has_spread(values: &[f64]) -> bool {
    if values.is_empty() {
        return false;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance > f64::EPSILON * mean * mean
}

/// Two-sided p-value for H0: ρ = 0
///
/// n = 2 leaves no degrees of freedom, so any r is uninformative (p = 1).
/// A perfect correlation with n > 2 gives p = 0.
pub fn two_sided_p_value(r: f64, n: usize) -> f64 {
    if n <= 2 {
        return 1.0;
    }
    let df = (n - 2) as f64;
    let one_minus_r2 = 1.0 - r * r;
    if one_minus_r2 <= f64::EPSILON {
        return 0.0;
    }

    let t = r * (df / one_minus_r2).sqrt();
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * dist.sf(t.abs())).clamp(0.0, 1.0),
        Err(e) => {
            debug!(df, error = %e, "Student t distribution unavailable");
            1.0
        }
    }
}
