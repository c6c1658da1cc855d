//! LLM-backed extractor using an OpenAI-compatible chat-completions API.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LlmConfig;
use crate::models::extraction::ExtractedTask;
use crate::models::item::SourceType;
use crate::models::task::TaskPriority;
use crate::{AppError, Result};

use super::{ExtractionContext, Extractor};

const SYSTEM_PROMPT: &str = "You turn raw productivity source text into task candidates. \
Respond with a JSON object {\"tasks\": [...]} where each task has: \
title (short imperative string), description (string or null), \
priority (one of critical|high|medium|low), due_date (RFC 3339 string or null), \
tags (array of lowercase strings), confidence (number 0..1 that the text really \
describes a task for the reader). Return an empty tasks array when nothing is actionable.";

/// Calls an OpenAI-compatible chat-completions endpoint and parses the
/// structured candidate list out of the response.
pub struct LlmExtractor {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    response_format: ResponseFormat<'a>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ExtractionPayload {
    #[serde(default)]
    tasks: Vec<CandidatePayload>,
}

#[derive(Deserialize)]
struct CandidatePayload {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    due_date: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    confidence: f64,
}

impl LlmExtractor {
    /// Construct an extractor with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Config(format!("cannot build llm client: {err}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    async fn call(&self, text: &str, source: SourceType, sender: Option<&str>) -> Result<Vec<ExtractedTask>> {
        if self.api_key.is_empty() {
            return Err(AppError::Extraction("no LLM API key configured".to_owned()));
        }

        let user_content = match sender {
            Some(sender) => format!("Source: {source}\nKnown sender: {sender}\n\n{text}"),
            None => format!("Source: {source}\n\n{text}"),
        };
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_content,
                },
            ],
            temperature: 0.2,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| AppError::Extraction(format!("llm request failed: {err}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Extraction(format!("llm returned {status}")));
        }
        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|err| AppError::Extraction(format!("llm response decode failed: {err}")))?;

        let content = chat
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .ok_or_else(|| AppError::Extraction("llm response has no content".to_owned()))?;
        let payload: ExtractionPayload = serde_json::from_str(content)
            .map_err(|err| AppError::Extraction(format!("llm content is not valid JSON: {err}")))?;

        debug!(count = payload.tasks.len(), "llm extraction returned candidates");
        Ok(payload.tasks.into_iter().map(into_candidate).collect())
    }
}

/// Map one raw candidate payload into the domain model, tolerating
/// malformed priority and due-date strings.
fn into_candidate(payload: CandidatePayload) -> ExtractedTask {
    let priority = payload
        .priority
        .as_deref()
        .map_or(TaskPriority::Medium, TaskPriority::from_hint);
    let due_date: Option<DateTime<Utc>> = payload
        .due_date
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc));

    ExtractedTask {
        title: payload.title,
        description: payload.description,
        priority,
        due_date,
        tags: payload.tags,
        confidence: payload.confidence.clamp(0.0, 1.0),
    }
}

impl Extractor for LlmExtractor {
    fn extract<'a>(
        &'a self,
        text: &'a str,
        source: SourceType,
        context: Option<&'a ExtractionContext>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ExtractedTask>>> + Send + 'a>> {
        let sender = context.and_then(|ctx| ctx.sender.as_deref());
        Box::pin(self.call(text, source, sender))
    }
}
