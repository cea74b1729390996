//! HTTP API for the Sahayak gateway.
//!
//! Handlers turn inbound JSON (or multipart) bodies into request descriptors,
//! route them through a [`ProviderChain`] and shape the reply.
//!
//! # Endpoints
//!
//! - `GET /` - Service info
//! - `GET /health` - Provider and visual strategy readiness (`?refresh=true` re-probes)
//! - `POST /content/generate` - Hyper-local content
//! - `POST /content/text-to-speech` - Browser speech settings
//! - `POST /knowledge/ask` - Knowledge base answer
//! - `POST /lessons/generate` - Lesson plan
//! - `POST /worksheets/generate` - One worksheet per grade, optionally from a page image
//! - `POST /visuals/generate` - Visual aid with a model-written description
//! - `GET /visuals/generate-image` - Visual aid straight from the prompt
//! - `POST /assessment/analyze` - Multipart reading assessment
//! - `POST /assessment/generate-text` - Read-aloud passage
//! - `/uploads/*` - Generated images
//!
//! # Example
//!
//! ```no_run
//! use sahayak_gateway::{create_router, AppState, Config};
//!
//! # async fn example() -> std::io::Result<()> {
//! let state = AppState::connect(Config::default()).await;
//! let router = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, router).await
//! # }
//! ```

use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
        DefaultBodyLimit, Multipart, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use sahayak_assessment::{
    score, AssessmentError, CannedTranscriber, OffsetScorePolicy, ReadingAssessment,
    ScorePolicy, Transcriber,
};
use sahayak_visual::{StrategyStatus, VisualProvider, VisualRequest, VisualStrategy};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{debug, error, info, warn};

use crate::config::{Config, ProviderKind};
use crate::fallback::APOLOGY;
use crate::provider::{
    CloudModelProvider, GenerationProvider, LocalModelProvider, ProviderChain, ProviderState,
};
use crate::request::{
    deserialize_grade, deserialize_grades, ContentType, Language, Length, RequestDescriptor,
};
use crate::{prompt, speech};

/// Largest accepted request body (audio uploads, page images).
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Most distinct grades one worksheet request may ask for.
const MAX_WORKSHEET_GRADES: usize = 12;

/// Worksheets generated at the same time.
const WORKSHEET_CONCURRENCY: usize = 4;

fn default_grade() -> String {
    "3".to_string()
}

fn default_subject() -> String {
    "General".to_string()
}

fn default_style() -> String {
    "illustration".to_string()
}

fn default_visual_subject() -> String {
    "general".to_string()
}

fn default_medium() -> String {
    "medium".to_string()
}

const fn default_content_type() -> ContentType {
    ContentType::Content
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Service banner returned by `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Service name.
    pub name: String,
    /// Crate version.
    pub version: String,
    /// Always `running`.
    pub status: String,
}

/// Query for `GET /health`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthQuery {
    /// Re-probe providers before answering.
    #[serde(default)]
    pub refresh: bool,
}

/// Readiness of every backend.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `healthy` when the server answers.
    pub status: String,
    /// Local model provider snapshot.
    pub local: ProviderState,
    /// Cloud model provider snapshot.
    pub cloud: ProviderState,
    /// Visual strategies in rank order.
    pub visuals: Vec<StrategyStatus>,
    /// When this report was built.
    pub timestamp: DateTime<Utc>,
}

/// Body of `POST /content/generate`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRequest {
    /// What to write about.
    #[serde(default)]
    pub topic: String,
    /// Content shape, `content` by default.
    #[serde(default = "default_content_type", alias = "content_type")]
    pub content_type: ContentType,
    /// Grade level.
    #[serde(
        default = "default_grade",
        alias = "grade_level",
        deserialize_with = "deserialize_grade"
    )]
    pub grade_level: String,
    /// Output language.
    #[serde(default)]
    pub language: Language,
    /// Output length.
    #[serde(default)]
    pub length: Length,
    /// Subject.
    #[serde(default = "default_subject")]
    pub subject: String,
}

/// Reply of `POST /content/generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentResponse {
    /// Generated or fallback text.
    pub content: String,
    /// Echoed topic.
    pub topic: String,
    /// Echoed language.
    pub language: Language,
    /// Echoed grade level.
    pub grade_level: String,
    /// Echoed content type.
    pub content_type: ContentType,
}

/// Body of `POST /content/text-to-speech`.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechRequest {
    /// Text to speak.
    #[serde(default)]
    pub text: String,
    /// Voice language.
    #[serde(default)]
    pub language: Language,
}

/// Reply of `POST /content/text-to-speech`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechResponse {
    /// Base64 JSON settings for the browser speech API.
    pub audio_config: String,
    /// Always `true`.
    pub success: bool,
}

/// Body of `POST /knowledge/ask`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeRequest {
    /// The student's question.
    #[serde(default)]
    pub question: String,
    /// Answer language.
    #[serde(default)]
    pub language: Language,
    /// Grade level the answer is pitched at.
    #[serde(
        default = "default_grade",
        alias = "gradeLevel",
        alias = "grade_level",
        deserialize_with = "deserialize_grade"
    )]
    pub complexity: String,
    /// Answer length.
    #[serde(default)]
    pub length: Length,
}

/// Reply of `POST /knowledge/ask`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeResponse {
    /// Generated or fallback answer.
    pub answer: String,
    /// Echoed question.
    pub question: String,
    /// Echoed language.
    pub language: Language,
    /// Echoed grade level.
    pub complexity: String,
}

/// Body of `POST /lessons/generate`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonRequest {
    /// Lesson topic.
    #[serde(default)]
    pub topic: String,
    /// Subject.
    #[serde(default = "default_subject")]
    pub subject: String,
    /// Grade level.
    #[serde(
        default = "default_grade",
        alias = "grade_level",
        deserialize_with = "deserialize_grade"
    )]
    pub grade_level: String,
    /// Plan language.
    #[serde(default)]
    pub language: Language,
    /// Plan length.
    #[serde(default)]
    pub length: Length,
}

/// Reply of `POST /lessons/generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonResponse {
    /// Generated or fallback plan.
    pub lesson_plan: String,
    /// Echoed topic.
    pub topic: String,
    /// Echoed subject.
    pub subject: String,
    /// Echoed grade level.
    pub grade_level: String,
    /// Echoed language.
    pub language: Language,
}

/// Body of `POST /worksheets/generate`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorksheetRequest {
    /// Subject.
    #[serde(default)]
    pub subject: String,
    /// One worksheet per grade.
    #[serde(default, deserialize_with = "deserialize_grades")]
    pub grades: Vec<String>,
    /// Worksheet language.
    #[serde(default)]
    pub language: Language,
    /// Optional focus topic.
    #[serde(default)]
    pub topic: Option<String>,
    /// Optional textbook page, base64 or a data URL.
    #[serde(default)]
    pub image: Option<String>,
}

/// A worksheet for one grade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worksheet {
    /// Grade as requested.
    pub grade: String,
    /// Header plus exercises.
    pub content: String,
}

/// Reply of `POST /worksheets/generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorksheetResponse {
    /// Worksheets in request order.
    pub worksheets: Vec<Worksheet>,
    /// Echoed subject.
    pub subject: String,
    /// Echoed language.
    pub language: Language,
}

/// Body of `POST /visuals/generate` and query of `GET /visuals/generate-image`.
#[derive(Debug, Clone, Deserialize)]
pub struct VisualBody {
    /// What to draw.
    #[serde(default)]
    pub prompt: String,
    /// Style name.
    #[serde(default = "default_style")]
    pub style: String,
    /// Subject name.
    #[serde(default = "default_visual_subject")]
    pub subject: String,
    /// Caller-supplied description; skips the model description step.
    #[serde(default)]
    pub description: Option<String>,
}

/// Reply of the visual routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualResponse {
    /// Image URL or local reference path.
    pub image_url: String,
    /// Strategy that produced the image.
    pub strategy: VisualStrategy,
    /// Echoed prompt.
    pub prompt: String,
    /// Echoed style.
    pub style: String,
    /// Echoed subject.
    pub subject: String,
    /// Description used as the generation base, if any.
    pub description: Option<String>,
}

/// Reply of `POST /assessment/analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    /// What the transcriber heard.
    pub transcription: String,
    /// Scores, level, word counts and top mistakes.
    #[serde(flatten)]
    pub assessment: ReadingAssessment,
    /// Encouraging feedback for the student.
    pub feedback: String,
}

/// Body of `POST /assessment/generate-text`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassageRequest {
    /// Grade level.
    #[serde(
        default = "default_grade",
        alias = "grade_level",
        deserialize_with = "deserialize_grade"
    )]
    pub grade_level: String,
    /// Passage language.
    #[serde(default)]
    pub language: Language,
    /// `easy`, `medium` or `hard`.
    #[serde(default = "default_medium")]
    pub difficulty: String,
    /// `short`, `medium` or `long`.
    #[serde(default = "default_medium", alias = "word_limit", alias = "length")]
    pub word_limit: String,
}

/// Reply of `POST /assessment/generate-text`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassageResponse {
    /// Generated or fallback passage.
    pub text: String,
    /// Echoed grade level.
    pub grade_level: String,
    /// Echoed language.
    pub language: Language,
    /// Echoed difficulty.
    pub difficulty: String,
}

/// Error response body returned on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error.
    pub error: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state, built once at startup.
#[derive(Clone)]
pub struct AppState {
    /// Gateway configuration.
    pub config: Config,
    /// Local model provider.
    pub local: Arc<dyn GenerationProvider>,
    /// Cloud model provider.
    pub cloud: Arc<dyn GenerationProvider>,
    /// Visual strategy chain.
    pub visuals: Arc<VisualProvider>,
    /// Speech-to-text collaborator.
    pub transcriber: Arc<dyn Transcriber>,
    /// Composite score policy.
    pub policy: Arc<dyn ScorePolicy>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("local", &self.local)
            .field("cloud", &self.cloud)
            .field("visuals", &self.visuals)
            .field("transcriber", &self.transcriber.name())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Builds every provider from `config`, probing the local model server once.
    pub async fn connect(config: Config) -> Self {
        let client = Client::new();
        let local: Arc<dyn GenerationProvider> = Arc::new(
            LocalModelProvider::connect(client.clone(), config.local_model.clone()).await,
        );
        let cloud: Arc<dyn GenerationProvider> = Arc::new(CloudModelProvider::new(
            client.clone(),
            config.cloud_model.clone(),
        ));
        let visuals = Arc::new(VisualProvider::from_config(&config.visual, client));
        Self::with_providers(config, local, cloud, visuals)
    }

    /// Uses the given providers with the canned transcriber and default policy.
    #[must_use]
    pub fn with_providers(
        config: Config,
        local: Arc<dyn GenerationProvider>,
        cloud: Arc<dyn GenerationProvider>,
        visuals: Arc<VisualProvider>,
    ) -> Self {
        Self {
            config,
            local,
            cloud,
            visuals,
            transcriber: Arc::new(CannedTranscriber),
            policy: Arc::new(OffsetScorePolicy),
        }
    }

    /// Provider order for a flow whose primary kind is `primary`.
    #[must_use]
    pub fn chain(&self, primary: ProviderKind) -> ProviderChain {
        ProviderChain::routed(primary, &self.local, &self.cloud)
    }
}

// ============================================================================
// API Error Type
// ============================================================================

/// Internal error type for API handlers.
#[derive(Debug)]
enum ApiError {
    /// The request body or a field was malformed.
    BadRequest(String),
    /// Something unexpected failed; the detail is only logged.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(detail) => {
                error!(error = %detail, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, APOLOGY.to_string())
            }
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

/// Strips a `data:image/...;base64,` prefix.
fn image_payload(image: &str) -> &str {
    image
        .split_once(";base64,")
        .map_or(image, |(_, data)| data)
        .trim()
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with all endpoints.
///
/// The router carries permissive CORS for the development frontend, request
/// tracing, a raised body limit for uploads and static serving of
/// `server.staticDir` under `/uploads`.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let uploads = ServeDir::new(&state.config.server.static_dir);

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/content/generate", post(handle_generate_content))
        .route("/content/text-to-speech", post(handle_text_to_speech))
        .route("/knowledge/ask", post(handle_ask))
        .route("/lessons/generate", post(handle_generate_lesson))
        .route("/worksheets/generate", post(handle_generate_worksheets))
        .route("/visuals/generate", post(handle_generate_visual))
        .route("/visuals/generate-image", get(handle_generate_image))
        .route("/assessment/analyze", post(handle_analyze_reading))
        .route("/assessment/generate-text", post(handle_generate_passage))
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

// ============================================================================
// Handlers
// ============================================================================

async fn handle_root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: "Sahayak Gateway".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
    })
}

/// Handler for `GET /health`.
async fn handle_health(
    State(state): State<Arc<AppState>>,
    query: Result<Query<HealthQuery>, QueryRejection>,
) -> Result<Json<HealthResponse>, ApiError> {
    let Query(query) = query?;
    let (local, cloud) = if query.refresh {
        info!("Re-probing providers");
        (state.local.refresh().await, state.cloud.refresh().await)
    } else {
        (state.local.state().await, state.cloud.state().await)
    };

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        local,
        cloud,
        visuals: state.visuals.strategies(),
        timestamp: Utc::now(),
    }))
}

/// Handler for `POST /content/generate`.
async fn handle_generate_content(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ContentRequest>, JsonRejection>,
) -> Result<Json<ContentResponse>, ApiError> {
    let Json(request) = payload?;
    require("topic", &request.topic)?;

    let descriptor = RequestDescriptor::new(request.topic.trim())
        .with_language(request.language.code())
        .with_content_type(request.content_type)
        .with_grade(request.grade_level)
        .with_length(request.length)
        .with_subject(request.subject);
    info!(
        topic = %descriptor.topic,
        language = %descriptor.language,
        module = %descriptor.content_type.label(),
        "Generating content"
    );

    let content = state
        .chain(state.config.routing.content)
        .generate_text(&descriptor)
        .await;

    Ok(Json(ContentResponse {
        content,
        topic: descriptor.topic,
        language: descriptor.language,
        grade_level: descriptor.grade_level,
        content_type: descriptor.content_type,
    }))
}

/// Handler for `POST /content/text-to-speech`.
async fn handle_text_to_speech(
    payload: Result<Json<SpeechRequest>, JsonRejection>,
) -> Result<Json<SpeechResponse>, ApiError> {
    let Json(request) = payload?;
    require("text", &request.text)?;

    let audio_config = speech::speech_config(&request.text, &request.language)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    debug!(language = %request.language, chars = request.text.chars().count(), "Speech settings built");

    Ok(Json(SpeechResponse {
        audio_config,
        success: true,
    }))
}

/// Handler for `POST /knowledge/ask`.
async fn handle_ask(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<KnowledgeRequest>, JsonRejection>,
) -> Result<Json<KnowledgeResponse>, ApiError> {
    let Json(request) = payload?;
    require("question", &request.question)?;

    let descriptor = RequestDescriptor::new(request.question.trim())
        .with_language(request.language.code())
        .with_content_type(ContentType::Answer)
        .with_grade(request.complexity)
        .with_length(request.length);
    info!(question = %descriptor.topic, language = %descriptor.language, "Answering question");

    let answer = state
        .chain(state.config.routing.knowledge)
        .generate_text(&descriptor)
        .await;

    Ok(Json(KnowledgeResponse {
        answer,
        question: descriptor.topic,
        language: descriptor.language,
        complexity: descriptor.grade_level,
    }))
}

/// Handler for `POST /lessons/generate`.
async fn handle_generate_lesson(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LessonRequest>, JsonRejection>,
) -> Result<Json<LessonResponse>, ApiError> {
    let Json(request) = payload?;
    require("topic", &request.topic)?;

    let descriptor = RequestDescriptor::new(request.topic.trim())
        .with_language(request.language.code())
        .with_content_type(ContentType::LessonPlan)
        .with_grade(request.grade_level)
        .with_length(request.length)
        .with_subject(request.subject);
    info!(topic = %descriptor.topic, subject = %descriptor.subject, "Generating lesson plan");

    let lesson_plan = state
        .chain(state.config.routing.lessons)
        .generate_text(&descriptor)
        .await;

    Ok(Json(LessonResponse {
        lesson_plan,
        subject: descriptor.subject_or_default().to_string(),
        topic: descriptor.topic,
        grade_level: descriptor.grade_level,
        language: descriptor.language,
    }))
}

/// Builds one worksheet, trying the page image first when one was sent.
async fn worksheet_for(
    chain: &ProviderChain,
    request: &WorksheetRequest,
    image: Option<&str>,
    grade: &str,
) -> Worksheet {
    let subject = request.subject.trim();
    let topic = request.topic.as_deref();
    let descriptor = RequestDescriptor::new(topic.unwrap_or(subject))
        .with_language(request.language.code())
        .with_content_type(ContentType::Worksheet)
        .with_grade(grade)
        .with_subject(subject);

    let from_image = match image {
        Some(image) => {
            let prompt = prompt::worksheet(grade, subject, topic, &request.language, true);
            match chain.describe_image(&prompt, image).await {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!(grade = %grade, error = %e, "Image worksheet failed, using text prompt");
                    None
                }
            }
        }
        None => None,
    };
    let body = match from_image {
        Some(text) => text,
        None => {
            let prompt = prompt::worksheet(grade, subject, topic, &request.language, false);
            chain.complete(&prompt, &descriptor).await
        }
    };

    Worksheet {
        grade: grade.trim().to_string(),
        content: format!("{}{body}", prompt::worksheet_header(grade, subject)),
    }
}

/// Trimmed, non-empty grades in request order, duplicates removed.
fn distinct_grades(grades: &[String]) -> Vec<&str> {
    let mut distinct: Vec<&str> = Vec::new();
    for grade in grades.iter().map(|grade| grade.trim()) {
        if !grade.is_empty() && !distinct.contains(&grade) {
            distinct.push(grade);
        }
    }
    distinct
}

/// Handler for `POST /worksheets/generate`.
async fn handle_generate_worksheets(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<WorksheetRequest>, JsonRejection>,
) -> Result<Json<WorksheetResponse>, ApiError> {
    let Json(request) = payload?;
    require("subject", &request.subject)?;
    let grades = distinct_grades(&request.grades);
    if grades.is_empty() {
        return Err(ApiError::BadRequest("grades must list at least one grade".to_string()));
    }
    if grades.len() > MAX_WORKSHEET_GRADES {
        return Err(ApiError::BadRequest(format!(
            "grades may list at most {MAX_WORKSHEET_GRADES} distinct grades"
        )));
    }

    let image = request
        .image
        .as_deref()
        .map(image_payload)
        .filter(|image| !image.is_empty());
    info!(
        subject = %request.subject,
        grades = grades.len(),
        with_image = image.is_some(),
        "Generating worksheets"
    );

    let chain = state.chain(state.config.routing.worksheets);
    let (chain, request) = (&chain, &request);
    let worksheets: Vec<Worksheet> = stream::iter(grades.into_iter().map(str::to_owned))
        .map(|grade: String| async move { worksheet_for(chain, request, image, &grade).await })
        .buffered(WORKSHEET_CONCURRENCY)
        .collect()
        .await;

    Ok(Json(WorksheetResponse {
        worksheets,
        subject: request.subject.trim().to_string(),
        language: request.language.clone(),
    }))
}

async fn create_visual(
    state: &AppState,
    body: VisualBody,
    describe: bool,
) -> Result<Json<VisualResponse>, ApiError> {
    require("prompt", &body.prompt)?;

    let description = match body.description.filter(|d| !d.trim().is_empty()) {
        Some(description) => Some(description),
        None if describe => {
            let prompt = prompt::visual_description(&body.prompt, &body.style, &body.subject);
            match state.chain(state.config.routing.visuals).try_complete(&prompt).await {
                Ok(description) => Some(description),
                Err(e) => {
                    warn!(error = %e, "Visual description unavailable, using prompt");
                    None
                }
            }
        }
        None => None,
    };

    let mut request = VisualRequest::new(body.prompt.trim(), &body.style, &body.subject);
    if let Some(description) = &description {
        request = request.with_description(description.clone());
    }
    let visual = state.visuals.create_visual(&request).await;
    info!(strategy = %visual.strategy_used, url = %visual.url, "Visual created");

    Ok(Json(VisualResponse {
        image_url: visual.url,
        strategy: visual.strategy_used,
        prompt: request.prompt,
        style: request.style,
        subject: request.subject,
        description,
    }))
}

/// Handler for `POST /visuals/generate`.
async fn handle_generate_visual(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VisualBody>, JsonRejection>,
) -> Result<Json<VisualResponse>, ApiError> {
    let Json(body) = payload?;
    create_visual(&state, body, true).await
}

/// Handler for `GET /visuals/generate-image`.
async fn handle_generate_image(
    State(state): State<Arc<AppState>>,
    query: Result<Query<VisualBody>, QueryRejection>,
) -> Result<Json<VisualResponse>, ApiError> {
    let Query(body) = query?;
    create_visual(&state, body, false).await
}

/// Handler for `POST /assessment/analyze`.
///
/// Multipart fields: `audio` (file), `originalText`, `language`, `gradeLevel`.
async fn handle_analyze_reading(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let mut multipart = multipart?;
    let bad_field = |e: MultipartError| ApiError::BadRequest(e.to_string());

    let mut audio = None;
    let mut original_text = String::new();
    let mut language = Language::default();
    let mut grade = default_grade();
    while let Some(field) = multipart.next_field().await.map_err(bad_field)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" => audio = Some(field.bytes().await.map_err(bad_field)?),
            "originalText" | "original_text" => {
                original_text = field.text().await.map_err(bad_field)?;
            }
            "language" => language = Language::from_code(&field.text().await.map_err(bad_field)?),
            "gradeLevel" | "grade_level" => grade = field.text().await.map_err(bad_field)?,
            _ => debug!(field = %name, "Ignoring multipart field"),
        }
    }
    let audio = audio.ok_or_else(|| ApiError::BadRequest("audio is required".to_string()))?;
    require("originalText", &original_text)?;

    let transcription = match state.transcriber.transcribe(&audio, language.code()).await {
        Ok(text) => text,
        Err(e @ AssessmentError::EmptyAudio) => return Err(ApiError::BadRequest(e.to_string())),
        Err(e) => return Err(ApiError::Internal(e.to_string())),
    };

    let report = score(&original_text, &transcription);
    let assessment = ReadingAssessment::from_report(&report, state.policy.as_ref());
    info!(
        transcriber = state.transcriber.name(),
        accuracy = assessment.accuracy(),
        level = %assessment.fluency_level,
        "Reading scored"
    );

    let descriptor = RequestDescriptor::new("Reading practice")
        .with_language(language.code())
        .with_content_type(ContentType::Assessment)
        .with_grade(grade);
    let prompt = prompt::reading_feedback(
        descriptor.grade(),
        &language,
        &original_text,
        &transcription,
        &report,
    );
    let feedback = state
        .chain(state.config.routing.assessment)
        .complete(&prompt, &descriptor)
        .await;

    Ok(Json(AnalyzeResponse {
        transcription,
        assessment,
        feedback,
    }))
}

/// Handler for `POST /assessment/generate-text`.
async fn handle_generate_passage(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PassageRequest>, JsonRejection>,
) -> Result<Json<PassageResponse>, ApiError> {
    let Json(request) = payload?;

    let descriptor = RequestDescriptor::new("Reading passage")
        .with_language(request.language.code())
        .with_content_type(ContentType::Assessment)
        .with_grade(request.grade_level);
    let prompt = prompt::reading_passage(
        descriptor.grade(),
        &request.difficulty,
        &request.word_limit,
        &descriptor.language,
    );
    info!(grade = %descriptor.grade(), difficulty = %request.difficulty, "Generating reading passage");

    let text = state
        .chain(state.config.routing.assessment)
        .complete(&prompt, &descriptor)
        .await;

    Ok(Json(PassageResponse {
        text,
        grade_level: descriptor.grade_level,
        language: descriptor.language,
        difficulty: request.difficulty,
    }))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use sahayak_visual::placeholder::PlaceholderBuilder;
    use sahayak_visual::VisualConfig;
    use tower::util::ServiceExt;

    use super::*;
    use crate::fallback;
    use crate::provider::stub::StubProvider;

    const BOUNDARY: &str = "sahayak-test-boundary";
    const CANNED_ENGLISH: &str =
        "The cat sat on the mat. It was a big cat. The cat was black and white.";

    /// Creates a test app state with stub providers and a placeholder-only visual chain.
    fn test_state(local_up: bool, cloud_up: bool) -> AppState {
        let visuals = Arc::new(VisualProvider::with_sources(
            Vec::new(),
            PlaceholderBuilder::new(VisualConfig::default().placeholder_base),
        ));
        AppState::with_providers(
            Config::default(),
            StubProvider::arc(ProviderKind::Local, local_up, "local"),
            StubProvider::arc(ProviderKind::Cloud, cloud_up, "cloud"),
            visuals,
        )
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = create_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn multipart(fields: &[(&str, &[u8])]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            if *name == "audio" {
                body.extend_from_slice(
                    b"Content-Disposition: form-data; name=\"audio\"; filename=\"reading.wav\"\r\nContent-Type: audio/wav\r\n\r\n",
                );
            } else {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
            }
            body.extend_from_slice(value);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/assessment/analyze")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    // ------------------------------------------------------------------------
    // Service endpoints
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_root_reports_service_info() {
        let (status, body) = send(test_state(true, true), get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Sahayak Gateway");
        assert_eq!(body["status"], "running");
    }

    #[tokio::test]
    async fn test_health_reports_provider_snapshots() {
        let (status, body) = send(test_state(false, true), get("/health?refresh=true")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["local"]["available"], false);
        assert_eq!(body["cloud"]["available"], true);
        assert_eq!(body["cloud"]["model"], "stub");
        assert_eq!(body["visuals"][0]["strategy"], "placeholder");
    }

    // ------------------------------------------------------------------------
    // Content endpoints
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_generate_content_routes_to_local_first() {
        let request = post_json(
            "/content/generate",
            &serde_json::json!({ "topic": "Monsoon", "grade_level": 4 }),
        );
        let (status, body) = send(test_state(true, true), request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["content"]
            .as_str()
            .unwrap()
            .starts_with("local: IMPORTANT: Respond ONLY in English."));
        assert_eq!(body["contentType"], "content");
        assert_eq!(body["gradeLevel"], "4");
        assert_eq!(body["language"], "en");
    }

    #[tokio::test]
    async fn test_generate_content_without_providers_returns_fallback() {
        let request = post_json(
            "/content/generate",
            &serde_json::json!({ "topic": "Monsoon", "language": "hi", "gradeLevel": "2" }),
        );
        let (status, body) = send(test_state(false, false), request).await;

        assert_eq!(status, StatusCode::OK);
        let expected =
            fallback::fallback_text(&Language::Hindi, "Monsoon", crate::request::GradeBand::Two);
        assert_eq!(body["content"], expected);
    }

    #[tokio::test]
    async fn test_generate_content_requires_topic() {
        let request = post_json("/content/generate", &serde_json::json!({ "topic": "  " }));
        let (status, body) = send(test_state(true, true), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "topic is required");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/content/generate")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(test_state(true, true), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body["error"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_text_to_speech_returns_encoded_settings() {
        let request = post_json(
            "/content/text-to-speech",
            &serde_json::json!({ "text": "नमस्ते", "language": "hi" }),
        );
        let (status, body) = send(test_state(true, true), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let decoded = STANDARD
            .decode(body["audioConfig"].as_str().unwrap())
            .unwrap();
        let settings: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(settings["lang"], "hi-IN");
        assert_eq!(settings["text"], "नमस्ते");
    }

    #[tokio::test]
    async fn test_knowledge_prefers_local_and_falls_to_cloud() {
        let request = post_json(
            "/knowledge/ask",
            &serde_json::json!({ "question": "Why is the sky blue?", "complexity": "5" }),
        );
        let (status, body) = send(test_state(false, true), request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["answer"].as_str().unwrap().starts_with("cloud: "));
        assert_eq!(body["question"], "Why is the sky blue?");
        assert_eq!(body["complexity"], "5");
    }

    #[tokio::test]
    async fn test_lesson_plan_routes_to_cloud_first() {
        let request = post_json(
            "/lessons/generate",
            &serde_json::json!({ "topic": "Fractions", "subject": "Mathematics" }),
        );
        let (status, body) = send(test_state(true, true), request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["lessonPlan"].as_str().unwrap().starts_with("cloud: "));
        assert_eq!(body["subject"], "Mathematics");
        assert_eq!(body["gradeLevel"], "3");
    }

    // ------------------------------------------------------------------------
    // Worksheet endpoint
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_worksheets_one_per_grade_with_header() {
        let request = post_json(
            "/worksheets/generate",
            &serde_json::json!({ "subject": "Science", "grades": ["2", 4] }),
        );
        let (status, body) = send(test_state(true, true), request).await;

        assert_eq!(status, StatusCode::OK);
        let sheets = body["worksheets"].as_array().unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0]["grade"], "2");
        assert_eq!(sheets[1]["grade"], "4");
        let first = sheets[0]["content"].as_str().unwrap();
        assert!(first.starts_with("Grade 2 Worksheet - Science\n=================================================="));
        assert!(first.ends_with("local: Create a worksheet for grade 2 students in Science."));
    }

    #[tokio::test]
    async fn test_worksheets_use_image_when_present() {
        let request = post_json(
            "/worksheets/generate",
            &serde_json::json!({
                "subject": "Science",
                "grades": ["3"],
                "image": "data:image/png;base64,aGk="
            }),
        );
        let (status, body) = send(test_state(true, true), request).await;

        assert_eq!(status, StatusCode::OK);
        let content = body["worksheets"][0]["content"].as_str().unwrap();
        assert!(content.ends_with("local sees an image"));
    }

    #[tokio::test]
    async fn test_worksheets_skip_duplicate_grades() {
        let request = post_json(
            "/worksheets/generate",
            &serde_json::json!({ "subject": "Science", "grades": ["3", 3, " 3 ", "5", ""] }),
        );
        let (status, body) = send(test_state(true, true), request).await;

        assert_eq!(status, StatusCode::OK);
        let grades: Vec<&str> = body["worksheets"]
            .as_array()
            .unwrap()
            .iter()
            .map(|sheet| sheet["grade"].as_str().unwrap())
            .collect();
        assert_eq!(grades, ["3", "5"]);
    }

    #[tokio::test]
    async fn test_worksheets_reject_too_many_grades() {
        let grades: Vec<String> = (1..=13).map(|grade| grade.to_string()).collect();
        let request = post_json(
            "/worksheets/generate",
            &serde_json::json!({ "subject": "Science", "grades": grades }),
        );
        let (status, body) = send(test_state(true, true), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("at most 12"));
    }

    #[test]
    fn test_distinct_grades_keeps_first_occurrence() {
        let grades = vec!["4".to_string(), "2".to_string(), "4 ".to_string()];
        assert_eq!(distinct_grades(&grades), ["4", "2"]);
    }

    #[tokio::test]
    async fn test_worksheets_require_grades() {
        let request = post_json(
            "/worksheets/generate",
            &serde_json::json!({ "subject": "Science", "grades": [] }),
        );
        let (status, _) = send(test_state(true, true), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    // ------------------------------------------------------------------------
    // Visual endpoints
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_visual_uses_model_description_and_placeholder() {
        let request = post_json(
            "/visuals/generate",
            &serde_json::json!({ "prompt": "water cycle", "style": "diagram", "subject": "science" }),
        );
        let (status, body) = send(test_state(true, true), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["strategy"], "placeholder");
        assert!(body["imageUrl"].as_str().unwrap().contains("water+cycle"));
        assert!(body["description"].as_str().unwrap().starts_with("cloud: "));
    }

    #[tokio::test]
    async fn test_visual_without_providers_still_returns_image() {
        let request = post_json("/visuals/generate", &serde_json::json!({ "prompt": "volcano" }));
        let (status, body) = send(test_state(false, false), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["strategy"], "placeholder");
        assert!(body["description"].is_null());
        assert_eq!(body["style"], "illustration");
    }

    #[tokio::test]
    async fn test_generate_image_query_skips_description() {
        let (status, body) = send(
            test_state(true, true),
            get("/visuals/generate-image?prompt=solar+system&style=cartoon"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["description"].is_null());
        assert_eq!(body["prompt"], "solar system");
        assert_eq!(body["style"], "cartoon");
    }

    // ------------------------------------------------------------------------
    // Assessment endpoints
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_analyze_scores_reading_and_adds_feedback() {
        let request = multipart(&[
            ("audio", b"RIFF fake wav"),
            ("originalText", CANNED_ENGLISH.as_bytes()),
            ("language", b"en"),
            ("gradeLevel", b"2"),
        ]);
        let (status, body) = send(test_state(true, true), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["transcription"], CANNED_ENGLISH);
        assert_eq!(body["scores"]["accuracy"], 100.0);
        assert_eq!(body["fluencyLevel"], "excellent");
        assert_eq!(body["correctWords"], 17);
        assert_eq!(body["totalWords"], 17);
        assert_eq!(
            body["feedback"],
            "cloud: Analyze this reading assessment for a Grade 2 student:"
        );
    }

    #[tokio::test]
    async fn test_analyze_reports_mistakes() {
        let request = multipart(&[
            ("audio", b"RIFF"),
            (
                "originalText",
                b"The dog sat on the mat. It was a big cat. The cat was black and white.",
            ),
        ]);
        let (status, body) = send(test_state(true, true), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["correctWords"], 16);
        let mistakes = body["mistakes"].as_array().unwrap();
        assert_eq!(mistakes.len(), 1);
        assert_eq!(mistakes[0]["expectedWord"], "dog");
        assert_eq!(mistakes[0]["actualWord"], "cat");
        assert_eq!(mistakes[0]["position"], 1);
    }

    #[tokio::test]
    async fn test_analyze_requires_audio_and_text() {
        let (status, body) = send(
            test_state(true, true),
            multipart(&[("originalText", b"hello")]),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "audio is required");

        let (status, _) = send(test_state(true, true), multipart(&[("audio", b"RIFF")])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            test_state(true, true),
            multipart(&[("audio", b""), ("originalText", b"hello")]),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("audio recording is empty"));
    }

    #[tokio::test]
    async fn test_generate_passage_uses_assessment_route() {
        let request = post_json(
            "/assessment/generate-text",
            &serde_json::json!({ "gradeLevel": 1, "difficulty": "easy", "language": "mr" }),
        );
        let (status, body) = send(test_state(true, false), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["text"],
            "local: Generate a simple and repetitive reading passage for Grade 1 students in Marathi."
        );
        assert_eq!(body["gradeLevel"], "1");
        assert_eq!(body["language"], "mr");
    }
}
