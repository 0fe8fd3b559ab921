use serde::{Deserialize, Serialize};
use std::fmt;

use super::tables::{ContributionMap, ScaleTable, SelectionMap, WeightMap};
use super::weights::normalize_weights;

/// How the index total is derived from per-factor contributions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexRounding {
    /// Sum the raw contributions and round once.
    #[default]
    RoundOfSum,
    /// Sum the already-rounded contributions, then round the total.
    SumOfRounded,
}

/// Effort band shown next to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EffortBand {
    Low,
    Moderate,
    High,
}

impl EffortBand {
    pub fn from_index(index: f64) -> Self {
        if index < 30.0 {
            EffortBand::Low
        } else if index < 60.0 {
            EffortBand::Moderate
        } else {
            EffortBand::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EffortBand::Low => "baixo",
            EffortBand::Moderate => "moderado",
            EffortBand::High => "alto",
        }
    }
}

impl fmt::Display for EffortBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IerResult {
    pub index: f64,
    pub contributions: ContributionMap,
}

impl IerResult {
    pub fn band(&self) -> EffortBand {
        EffortBand::from_index(self.index)
    }

    pub fn into_parts(self) -> (f64, ContributionMap) {
        (self.index, self.contributions)
    }
}

/// Round to 2 decimals from the exact binary value.
///
/// Scaling by 100 first can land a value stored just above or below a tie
/// exactly on it, so the rounding is done by the float formatter instead,
/// which works on the exact expansion and breaks true ties to even.
pub fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

/// Compute the index and per-factor contributions for one record.
///
/// `weights` is normalized internally, so raw and pre-normalized maps give the
/// same result. Unknown factors, unknown labels and missing weights all
/// degrade to a zero contribution. Only factors present in `selections`
/// appear in the output.
pub fn compute_ier(selections: &SelectionMap, scales: &ScaleTable, weights: &WeightMap) -> IerResult {
    compute_ier_with(selections, scales, weights, IndexRounding::default())
}

pub fn compute_ier_with(
    selections: &SelectionMap,
    scales: &ScaleTable,
    weights: &WeightMap,
    rounding: IndexRounding,
) -> IerResult {
    let normalized = normalize_weights(weights);
    let mut contributions = ContributionMap::new();
    let mut total = 0.0;

    for (factor, choice) in selections {
        let score = match scales.factor(factor) {
            Some(scale) => scale.score(choice).unwrap_or_else(|| {
                tracing::trace!(factor = %factor, choice = %choice, "unknown choice, scoring 0");
                0
            }),
            None => {
                tracing::trace!(factor = %factor, "factor not in scale table, scoring 0");
                0
            }
        };
        let weight = normalized.get(factor).copied().unwrap_or(0.0);
        let raw = f64::from(score) * (weight / 100.0);
        let rounded = round2(raw);

        total += match rounding {
            IndexRounding::SumOfRounded => rounded,
            IndexRounding::RoundOfSum => raw,
        };
        contributions.insert(factor.clone(), rounded);
    }

    IerResult {
        index: round2(total),
        contributions,
    }
}
