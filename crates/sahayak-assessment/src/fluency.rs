//! Position-aligned word comparison.
//!
//! Both texts are lower-cased and split on whitespace. Reference word `i`
//! is compared to transcribed word `i`; a transcription that runs out early
//! produces [`SKIPPED_MARKER`] mistakes, and surplus transcribed words are
//! ignored.

use serde::{Deserialize, Serialize};

use crate::policy::{CompositeScores, ScorePolicy};
use crate::{FluencyLevel, FluencyReport, WordMistake};

/// Placeholder recorded as the actual word when the student skipped it.
pub const SKIPPED_MARKER: &str = "[skipped]";

/// Number of mistakes surfaced to callers.
pub const MAX_REPORTED_MISTAKES: usize = 5;

/// Aligns `transcribed` against `reference` and reports accuracy.
///
/// # Example
///
/// ```
/// use sahayak_assessment::{score, SKIPPED_MARKER};
///
/// let report = score("one two three", "one two");
/// assert_eq!(report.mistakes.len(), 1);
/// assert_eq!(report.mistakes[0].position, 2);
/// assert_eq!(report.mistakes[0].actual_word, SKIPPED_MARKER);
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn score(reference: &str, transcribed: &str) -> FluencyReport {
    let reference_words = tokenize(reference);
    let transcribed_words = tokenize(transcribed);

    let mut correct = 0usize;
    let mut mistakes = Vec::new();

    for (position, expected) in reference_words.iter().enumerate() {
        match transcribed_words.get(position) {
            Some(actual) if actual == expected => correct += 1,
            Some(actual) => mistakes.push(WordMistake {
                expected_word: expected.clone(),
                actual_word: actual.clone(),
                position,
            }),
            None => mistakes.push(WordMistake {
                expected_word: expected.clone(),
                actual_word: SKIPPED_MARKER.to_string(),
                position,
            }),
        }
    }

    let total = reference_words.len();
    let accuracy_percent = if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    };

    FluencyReport {
        accuracy_percent,
        correct_word_count: correct,
        total_word_count: total,
        mistakes,
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// A scored reading, ready to be shown to a teacher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingAssessment {
    /// Policy-derived scores, rounded to one decimal.
    pub scores: CompositeScores,
    /// Band derived from raw accuracy.
    pub fluency_level: FluencyLevel,
    /// Words read correctly.
    pub correct_words: usize,
    /// Words in the reference passage.
    pub total_words: usize,
    /// First [`MAX_REPORTED_MISTAKES`] mistakes.
    pub mistakes: Vec<WordMistake>,
    /// Expected words of those mistakes.
    pub missed_words: Vec<String>,
}

impl ReadingAssessment {
    /// Scores a reading and applies `policy` to derive composite scores.
    pub fn evaluate(reference: &str, transcribed: &str, policy: &dyn ScorePolicy) -> Self {
        Self::from_report(&score(reference, transcribed), policy)
    }

    /// Builds an assessment from an existing report.
    pub fn from_report(report: &FluencyReport, policy: &dyn ScorePolicy) -> Self {
        let scores = policy.scores(report.accuracy_percent).rounded();
        Self {
            scores,
            fluency_level: report.level(),
            correct_words: report.correct_word_count,
            total_words: report.total_word_count,
            mistakes: report.top_mistakes(MAX_REPORTED_MISTAKES).to_vec(),
            missed_words: report.missed_words(MAX_REPORTED_MISTAKES),
        }
    }

    /// Accuracy rounded to one decimal, as shown in feedback prompts.
    pub const fn accuracy(&self) -> f64 {
        self.scores.accuracy
    }
}
