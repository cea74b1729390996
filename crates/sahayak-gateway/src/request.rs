//! The typed request descriptor every generation call is built from.
//!
//! Every field has a safe default and every parser is lenient: unknown
//! languages, grades and lengths degrade to the nearest known value instead of
//! failing.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Languages with dedicated prompt templates and localized messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Language {
    /// English.
    #[default]
    English,
    /// Hindi.
    Hindi,
    /// Marathi.
    Marathi,
    /// Bengali.
    Bengali,
    /// Telugu.
    Telugu,
    /// Tamil.
    Tamil,
    /// Gujarati.
    Gujarati,
    /// Kannada.
    Kannada,
    /// Malayalam.
    Malayalam,
    /// Urdu.
    Urdu,
    /// Any other code, served by the generic template.
    Other(String),
}

impl Language {
    /// Parses a language code such as `hi`, `hi-IN` or `TA`.
    ///
    /// Only the primary subtag is considered. An empty code means English.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        let code = code.trim().to_lowercase();
        let primary = code.split(['-', '_']).next().unwrap_or_default();
        match primary {
            "" | "en" => Self::English,
            "hi" => Self::Hindi,
            "mr" => Self::Marathi,
            "bn" => Self::Bengali,
            "te" => Self::Telugu,
            "ta" => Self::Tamil,
            "gu" => Self::Gujarati,
            "kn" => Self::Kannada,
            "ml" => Self::Malayalam,
            "ur" => Self::Urdu,
            other => Self::Other(other.to_string()),
        }
    }

    /// The short code.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
            Self::Marathi => "mr",
            Self::Bengali => "bn",
            Self::Telugu => "te",
            Self::Tamil => "ta",
            Self::Gujarati => "gu",
            Self::Kannada => "kn",
            Self::Malayalam => "ml",
            Self::Urdu => "ur",
            Self::Other(code) => code,
        }
    }

    /// English name used inside English-language prompts.
    #[must_use]
    pub fn english_name(&self) -> String {
        match self {
            Self::English => "English".to_string(),
            Self::Hindi => "Hindi".to_string(),
            Self::Marathi => "Marathi".to_string(),
            Self::Bengali => "Bengali".to_string(),
            Self::Telugu => "Telugu".to_string(),
            Self::Tamil => "Tamil".to_string(),
            Self::Gujarati => "Gujarati".to_string(),
            Self::Kannada => "Kannada".to_string(),
            Self::Malayalam => "Malayalam".to_string(),
            Self::Urdu => "Urdu".to_string(),
            Self::Other(code) => code.to_uppercase(),
        }
    }

    /// Returns `true` for codes without a dedicated template.
    #[must_use]
    pub const fn is_other(&self) -> bool {
        matches!(self, Self::Other(_))
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_code(&s))
    }
}

impl Serialize for Language {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.code())
    }
}

/// Pedagogical shape of the requested output.
///
/// Only used as a label in prompts and logs; it never changes branching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// Concept explanation (default).
    #[default]
    Explanation,
    /// Hyper-local content.
    Content,
    /// Worksheet.
    Worksheet,
    /// Visual aid.
    Visual,
    /// Reading assessment material.
    Assessment,
    /// Knowledge base answer.
    Answer,
    /// Story.
    Story,
    /// Worked example.
    Example,
    /// Classroom activity.
    Activity,
    /// Lesson plan.
    LessonPlan,
    /// Any other label, passed through.
    Other(String),
}

impl ContentType {
    /// Parses a content type name case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "" | "explanation" => Self::Explanation,
            "content" => Self::Content,
            "worksheet" => Self::Worksheet,
            "visual" => Self::Visual,
            "assessment" => Self::Assessment,
            "answer" => Self::Answer,
            "story" => Self::Story,
            "example" => Self::Example,
            "activity" => Self::Activity,
            "lesson_plan" => Self::LessonPlan,
            _ => Self::Other(normalized),
        }
    }

    /// Wire name, also embedded in prompts.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Explanation => "explanation",
            Self::Content => "content",
            Self::Worksheet => "worksheet",
            Self::Visual => "visual",
            Self::Assessment => "assessment",
            Self::Answer => "answer",
            Self::Story => "story",
            Self::Example => "example",
            Self::Activity => "activity",
            Self::LessonPlan => "lesson_plan",
            Self::Other(name) => name,
        }
    }

    /// Name of the application module the request came from.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::LessonPlan => "Lesson Planner".to_string(),
            Self::Explanation | Self::Answer => "Knowledge Base".to_string(),
            Self::Content => "Hyper Local Content Generator".to_string(),
            Self::Worksheet => "Worksheets".to_string(),
            Self::Visual => "Visual Aids".to_string(),
            Self::Assessment => "Assessment".to_string(),
            Self::Story | Self::Example | Self::Activity => "Content Generator".to_string(),
            Self::Other(name) => sahayak_visual::title_case(&name.replace('_', " ")),
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ContentType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_name(&s))
    }
}

impl Serialize for ContentType {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Grade bands with distinct vocabulary guidance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GradeBand {
    /// Grade 1, ages 6-7.
    One,
    /// Grade 2, ages 7-8.
    Two,
    /// Grade 3, ages 8-9. Used for unrecognized grades.
    #[default]
    Three,
    /// Grade 4, ages 9-10.
    Four,
    /// Grade 5, ages 10-11.
    Five,
}

impl GradeBand {
    /// Resolves a grade string; anything outside `1`..`5` is grade 3.
    ///
    /// ```
    /// use sahayak_gateway::GradeBand;
    ///
    /// assert_eq!(GradeBand::resolve(" 5 "), GradeBand::Five);
    /// assert_eq!(GradeBand::resolve("99"), GradeBand::Three);
    /// ```
    #[must_use]
    pub fn resolve(grade: &str) -> Self {
        match grade.trim() {
            "1" => Self::One,
            "2" => Self::Two,
            "4" => Self::Four,
            "5" => Self::Five,
            _ => Self::Three,
        }
    }

    /// Grade number.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
        }
    }

    /// Vocabulary and sentence-length directive for the model.
    #[must_use]
    pub const fn directive(self) -> &'static str {
        match self {
            Self::One => "Use very simple words that a 6-7 year old can understand. Use short sentences (5-8 words). Avoid complex concepts. Use familiar examples from daily life.",
            Self::Two => "Use simple words that a 7-8 year old can understand. Use short to medium sentences (8-12 words). Use basic concepts. Use examples from home and school.",
            Self::Three => "Use age-appropriate words for 8-9 year olds. Use clear, medium-length sentences (10-15 words). Explain concepts step by step. Use relatable examples.",
            Self::Four => "Use vocabulary suitable for 9-10 year olds. Use well-structured sentences (12-18 words). Include slightly more complex concepts with explanations.",
            Self::Five => "Use vocabulary appropriate for 10-11 year olds. Use detailed sentences (15-20 words). Include more advanced concepts with clear explanations and examples.",
        }
    }
}

impl std::fmt::Display for GradeBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Requested output length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Length {
    /// 100-150 words.
    Short,
    /// 200-300 words. Used for unrecognized lengths.
    #[default]
    Medium,
    /// 400-500 words.
    Long,
}

impl Length {
    /// Parses a length name; anything unrecognized is `Medium`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "short" => Self::Short,
            "long" => Self::Long,
            _ => Self::Medium,
        }
    }

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }

    /// Inclusive `(min, max)` word count.
    #[must_use]
    pub const fn word_band(self) -> (u32, u32) {
        match self {
            Self::Short => (100, 150),
            Self::Medium => (200, 300),
            Self::Long => (400, 500),
        }
    }
}

impl<'de> Deserialize<'de> for Length {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_name(&s))
    }
}

impl Serialize for Length {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Grade levels arrive as strings or bare numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum GradeValue {
    Text(String),
    Number(i64),
}

/// Deserializes a grade sent either as `"3"` or `3`.
///
/// # Errors
///
/// Fails only when the value is neither a string nor an integer.
pub fn deserialize_grade<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match GradeValue::deserialize(deserializer)? {
        GradeValue::Text(text) => text,
        GradeValue::Number(number) => number.to_string(),
    })
}

/// Deserializes a list of grades, each a string or a number.
///
/// # Errors
///
/// Fails when the value is not a list of strings and integers.
pub fn deserialize_grades<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Vec::<GradeValue>::deserialize(deserializer)?
        .into_iter()
        .map(|grade| match grade {
            GradeValue::Text(text) => text,
            GradeValue::Number(number) => number.to_string(),
        })
        .collect())
}

fn default_grade() -> String {
    "3".to_string()
}

fn default_subject() -> String {
    "General".to_string()
}

/// Immutable inputs for one generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDescriptor {
    /// What to generate about.
    #[serde(default)]
    pub topic: String,

    /// Output language.
    #[serde(default)]
    pub language: Language,

    /// Pedagogical shape of the output.
    #[serde(default, alias = "content_type")]
    pub content_type: ContentType,

    /// Grade as sent by the caller; see [`RequestDescriptor::grade`].
    #[serde(
        default = "default_grade",
        alias = "grade_level",
        deserialize_with = "deserialize_grade"
    )]
    pub grade_level: String,

    /// Output length.
    #[serde(default)]
    pub length: Length,

    /// Free-text subject.
    #[serde(default = "default_subject")]
    pub subject: String,
}

impl Default for RequestDescriptor {
    fn default() -> Self {
        Self::new("")
    }
}

impl RequestDescriptor {
    /// Creates a descriptor with every other field defaulted.
    #[must_use]
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            language: Language::default(),
            content_type: ContentType::default(),
            grade_level: default_grade(),
            length: Length::default(),
            subject: default_subject(),
        }
    }

    /// Sets the language from a code.
    #[must_use]
    pub fn with_language(mut self, code: &str) -> Self {
        self.language = Language::from_code(code);
        self
    }

    /// Sets the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// Sets the raw grade level.
    #[must_use]
    pub fn with_grade(mut self, grade: impl Into<String>) -> Self {
        self.grade_level = grade.into();
        self
    }

    /// Sets the length.
    #[must_use]
    pub const fn with_length(mut self, length: Length) -> Self {
        self.length = length;
        self
    }

    /// Sets the subject; blank subjects keep the default.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        let subject = subject.into();
        if !subject.trim().is_empty() {
            self.subject = subject;
        }
        self
    }

    /// The resolved grade band.
    #[must_use]
    pub fn grade(&self) -> GradeBand {
        GradeBand::resolve(&self.grade_level)
    }

    /// Subject, or `General` when blank.
    #[must_use]
    pub fn subject_or_default(&self) -> &str {
        let subject = self.subject.trim();
        if subject.is_empty() {
            "General"
        } else {
            subject
        }
    }
}
