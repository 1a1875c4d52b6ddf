//! Request handlers.

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::AppState;
use super::error::ApiError;
use super::upload::{StagedUpload, extension_for};
use crate::agent::{AgentOutcome, AnalysisRequest, HealthReport, SearchResult};

/// Instruction used when the client sends none.
pub const DEFAULT_PROMPT: &str = "Describe what you see in this image";

const PROMPT_REQUIRED: &str = "Prompt is required";

/// 1×1 PNG used by the pipeline smoke test.
const TEST_IMAGE_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// Agent metadata attached to every successful analysis.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSummary<'a> {
    web_search_used: bool,
    search_query: Option<&'a str>,
    iterations: u8,
    web_results: Option<&'a [SearchResult]>,
}

impl<'a> From<&'a AgentOutcome> for AgentSummary<'a> {
    fn from(outcome: &'a AgentOutcome) -> Self {
        Self {
            web_search_used: outcome.web_search_used(),
            search_query: outcome.search_query(),
            iterations: outcome.iterations_used(),
            web_results: outcome.web_results(),
        }
    }
}

/// Body of a successful analysis, shared by the HTTP API and `camgpt analyze`.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse<'a> {
    analysis: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    test: Option<bool>,
    agent: AgentSummary<'a>,
}

impl<'a> AnalyzeResponse<'a> {
    /// Wraps `outcome`; `model` and `test` are omitted when `None`.
    #[must_use]
    pub fn new(outcome: &'a AgentOutcome, model: Option<&'a str>, test: Option<bool>) -> Self {
        Self {
            analysis: outcome.final_answer(),
            status: "success",
            model,
            test,
            agent: AgentSummary::from(outcome),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
    timestamp: String,
    services: HealthReport,
}

/// Body of `POST /api/test-agent`.
#[derive(Debug, Deserialize)]
pub struct TestAgentRequest {
    #[serde(default)]
    prompt: Option<String>,
}

/// Image part of a multipart upload.
struct UploadedImage {
    bytes: Vec<u8>,
    mime_type: String,
}

/// `GET /api/health`
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let services = state.orchestrator.health().await;
    let body = HealthResponse {
        status: "OK",
        message: "CamGPT Backend API is running",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        services,
    };
    Json(serde_json::to_value(body).unwrap_or_default())
}

/// `POST /api/analyze-image`
///
/// Multipart fields: `image` (required, `image/*`) and `prompt` (optional).
pub async fn analyze_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    // A body that is not multipart at all carries no image either.
    let multipart = multipart.map_err(|_| ApiError::NoImage)?;
    let (image, prompt) = read_upload(&state, multipart).await?;
    let image = image.ok_or(ApiError::NoImage)?;
    let prompt = prompt
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PROMPT.to_string());

    tracing::info!(bytes = image.bytes.len(), mime = %image.mime_type, prompt = %prompt, "processing image");

    let staged = StagedUpload::stage(
        &state.config.upload_dir,
        image.bytes,
        extension_for(&image.mime_type),
    )
    .await
    .map_err(|e| ApiError::Internal(format!("failed to stage upload: {e}")))?;

    let result = run_staged(&state, &staged, &image.mime_type, prompt).await;
    staged.cleanup();
    let outcome = result?;

    tracing::info!("analysis completed successfully");
    Ok(Json(render(
        &outcome,
        Some(state.orchestrator.config().vision_model.as_str()),
        None,
    )))
}

/// `POST /api/test-agent`
///
/// Runs the pipeline on a built-in 1×1 PNG.
pub async fn test_agent(
    State(state): State<AppState>,
    body: Result<Json<TestAgentRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    // A missing or unparseable body carries no prompt either.
    let Json(body) = body.map_err(|_| ApiError::BadRequest(PROMPT_REQUIRED.to_string()))?;
    let prompt = body
        .prompt
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(PROMPT_REQUIRED.to_string()))?;

    let image = STANDARD
        .decode(TEST_IMAGE_BASE64)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let request = AnalysisRequest::new(image, Some("image/png"), prompt)?;
    let outcome = state.orchestrator.analyze(&request).await?;

    Ok(Json(render(&outcome, None, Some(true))))
}

/// Fallback for unknown paths.
pub async fn not_found() -> (axum::http::StatusCode, Json<serde_json::Value>) {
    (
        axum::http::StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "Endpoint not found",
            "status": "error",
        })),
    )
}

/// Pulls the `image` and `prompt` fields out of a multipart body.
async fn read_upload(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<(Option<UploadedImage>, Option<String>), ApiError> {
    let limit_mb = state.config.max_upload_mb();
    let mut image = None;
    let mut prompt = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::from_multipart(&e, limit_mb))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("image") => {
                let mime_type = field
                    .content_type()
                    .filter(|m| m.starts_with("image/"))
                    .ok_or(ApiError::NotAnImage)?
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::from_multipart(&e, limit_mb))?;
                if bytes.len() > state.config.max_upload_bytes {
                    return Err(ApiError::TooLarge { limit_mb });
                }
                image = Some(UploadedImage {
                    bytes: bytes.to_vec(),
                    mime_type,
                });
            }
            Some("prompt") => {
                prompt = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::from_multipart(&e, limit_mb))?,
                );
            }
            _ => {}
        }
    }

    Ok((image, prompt))
}

/// Reads the staged image back and runs the pipeline on it.
async fn run_staged(
    state: &AppState,
    staged: &StagedUpload,
    mime_type: &str,
    prompt: String,
) -> Result<AgentOutcome, ApiError> {
    let bytes = staged.read().await.map_err(ApiError::UnreadableImage)?;
    let request = AnalysisRequest::new(bytes, Some(mime_type), prompt)?;
    Ok(state.orchestrator.analyze(&request).await?)
}

fn render(outcome: &AgentOutcome, model: Option<&str>, test: Option<bool>) -> serde_json::Value {
    serde_json::to_value(AnalyzeResponse::new(outcome, model, test)).unwrap_or_default()
}
