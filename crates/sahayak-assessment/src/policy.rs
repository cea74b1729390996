//! Composite score policies.
//!
//! The default [`OffsetScorePolicy`] derives fluency, pronunciation and pace
//! as fixed offsets from word accuracy. It is an approximation for display,
//! not a linguistic fluency model, and has no empirical calibration behind
//! it. Swap in another [`ScorePolicy`] once a validated model exists.

use serde::{Deserialize, Serialize};

/// Scores shown alongside a reading assessment, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeScores {
    /// Mean of the four component scores.
    pub overall: f64,
    /// Reading flow.
    pub fluency: f64,
    /// Word accuracy.
    pub accuracy: f64,
    /// Word recognition.
    pub pronunciation: f64,
    /// Reading speed.
    pub pace: f64,
}

impl CompositeScores {
    /// Returns a copy with every score rounded to one decimal place.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self {
            overall: round_one_decimal(self.overall),
            fluency: round_one_decimal(self.fluency),
            accuracy: round_one_decimal(self.accuracy),
            pronunciation: round_one_decimal(self.pronunciation),
            pace: round_one_decimal(self.pace),
        }
    }
}

/// Derives composite scores from word accuracy.
pub trait ScorePolicy: Send + Sync {
    /// Computes scores for an accuracy percentage in `[0, 100]`.
    fn scores(&self, accuracy: f64) -> CompositeScores;
}

/// Fixed-offset policy: fluency = accuracy - 5, pronunciation = accuracy - 3,
/// pace = accuracy + 5, all clamped to `[0, 100]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OffsetScorePolicy;

impl OffsetScorePolicy {
    const FLUENCY_OFFSET: f64 = -5.0;
    const PRONUNCIATION_OFFSET: f64 = -3.0;
    const PACE_OFFSET: f64 = 5.0;
}

impl ScorePolicy for OffsetScorePolicy {
    fn scores(&self, accuracy: f64) -> CompositeScores {
        let accuracy = clamp_percent(accuracy);
        let fluency = clamp_percent(accuracy + Self::FLUENCY_OFFSET);
        let pronunciation = clamp_percent(accuracy + Self::PRONUNCIATION_OFFSET);
        let pace = clamp_percent(accuracy + Self::PACE_OFFSET);
        let overall = (accuracy + fluency + pronunciation + pace) / 4.0;

        CompositeScores {
            overall,
            fluency,
            accuracy,
            pronunciation,
            pace,
        }
    }
}

fn clamp_percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Rounds half away from zero to one decimal place.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
