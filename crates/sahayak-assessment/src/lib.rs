//! Sahayak Reading Assessment
//!
//! Scores a student's read-aloud attempt against the reference passage.
//!
//! The crate is pure computation apart from the [`transcription`] seam:
//! audio is turned into text by a pluggable [`Transcriber`], the text is
//! aligned word-by-word against the reference by [`score`], and a swappable
//! [`ScorePolicy`] derives the composite scores shown to teachers.
//!
//! # Types
//!
//! - [`FluencyReport`] - Accuracy, word counts and the ordered mistake list
//! - [`WordMistake`] - One mismatched or skipped reference word
//! - [`FluencyLevel`] - Coarse band used for feedback wording
//! - [`CompositeScores`] - Policy-derived overall/fluency/pronunciation/pace
//!
//! # Example
//!
//! ```rust
//! use sahayak_assessment::{score, FluencyLevel, OffsetScorePolicy, ScorePolicy};
//!
//! let report = score("the cat sat on the mat", "the cat sat on a mat");
//! assert_eq!(report.correct_word_count, 5);
//! assert_eq!(report.total_word_count, 6);
//!
//! let scores = OffsetScorePolicy.scores(report.accuracy_percent);
//! assert!(scores.pace >= scores.accuracy);
//! assert_eq!(report.level(), FluencyLevel::NeedsImprovement);
//! ```

mod fluency;
mod policy;
pub mod transcription;

pub use fluency::{score, ReadingAssessment, MAX_REPORTED_MISTAKES, SKIPPED_MARKER};
pub use policy::{round_one_decimal, CompositeScores, OffsetScorePolicy, ScorePolicy};
pub use transcription::{CannedTranscriber, Transcriber};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while assessing a reading.
#[derive(Debug, Error)]
pub enum AssessmentError {
    /// The uploaded recording contained no bytes.
    #[error("audio recording is empty\n\nSuggestion: Record the student reading again and re-upload the file")]
    EmptyAudio,

    /// The transcription backend could not produce text.
    #[error("transcription failed ({transcriber}): {message}")]
    TranscriptionFailed {
        /// Name of the transcriber that failed.
        transcriber: String,
        /// Description of the failure.
        message: String,
    },
}

/// Result type for assessment operations.
pub type Result<T> = std::result::Result<T, AssessmentError>;

// ============================================================================
// Fluency Report
// ============================================================================

/// A single reference word the student did not read correctly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordMistake {
    /// The word the reference text expected (lower-cased).
    pub expected_word: String,
    /// What the transcription contained at the same position, or
    /// [`SKIPPED_MARKER`] when the transcription ran out of words.
    pub actual_word: String,
    /// Zero-based index into the reference word sequence.
    pub position: usize,
}

impl WordMistake {
    /// Returns `true` if the student skipped this word entirely.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.actual_word == SKIPPED_MARKER
    }
}

/// Result of aligning a transcription against its reference text.
///
/// Derived per call and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FluencyReport {
    /// Percentage of reference words read correctly, in `[0, 100]`.
    ///
    /// Defined as `0.0` when the reference is empty.
    pub accuracy_percent: f64,
    /// Number of reference positions matched exactly.
    pub correct_word_count: usize,
    /// Number of words in the reference text.
    pub total_word_count: usize,
    /// Mistakes in reference order.
    pub mistakes: Vec<WordMistake>,
}

impl FluencyReport {
    /// Returns at most `limit` mistakes, in reference order.
    #[must_use]
    pub fn top_mistakes(&self, limit: usize) -> &[WordMistake] {
        &self.mistakes[..self.mistakes.len().min(limit)]
    }

    /// Returns the expected words of the first `limit` mistakes.
    #[must_use]
    pub fn missed_words(&self, limit: usize) -> Vec<String> {
        self.top_mistakes(limit)
            .iter()
            .map(|m| m.expected_word.clone())
            .collect()
    }

    /// Returns the coarse fluency band for this report.
    #[must_use]
    pub fn level(&self) -> FluencyLevel {
        FluencyLevel::from_accuracy(self.accuracy_percent)
    }
}

// ============================================================================
// Fluency Level
// ============================================================================

/// Coarse reading band derived from accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FluencyLevel {
    /// 95% and above.
    Excellent,
    /// 85% up to 95%.
    Good,
    /// 70% up to 85%.
    NeedsImprovement,
    /// Below 70%.
    Poor,
}

impl FluencyLevel {
    /// Maps an accuracy percentage onto a level.
    ///
    /// # Example
    ///
    /// ```
    /// use sahayak_assessment::FluencyLevel;
    ///
    /// assert_eq!(FluencyLevel::from_accuracy(96.0), FluencyLevel::Excellent);
    /// assert_eq!(FluencyLevel::from_accuracy(85.0), FluencyLevel::Good);
    /// assert_eq!(FluencyLevel::from_accuracy(12.5), FluencyLevel::Poor);
    /// ```
    #[must_use]
    pub fn from_accuracy(accuracy: f64) -> Self {
        if accuracy >= 95.0 {
            Self::Excellent
        } else if accuracy >= 85.0 {
            Self::Good
        } else if accuracy >= 70.0 {
            Self::NeedsImprovement
        } else {
            Self::Poor
        }
    }
}

impl std::fmt::Display for FluencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excellent => write!(f, "Excellent"),
            Self::Good => write!(f, "Good"),
            Self::NeedsImprovement => write!(f, "Needs Improvement"),
            Self::Poor => write!(f, "Poor"),
        }
    }
}
