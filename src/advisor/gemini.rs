//! Gemini Advisor
//!
//! Gemini REST API(`generateContent`)를 직접 호출하는 어드바이저 구현.
//! 모든 요청은 JSON 응답 스키마를 지정합니다.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::parse::{parse_analysis, parse_modification, parse_presets, parse_stats, parse_suggestions};
use super::prompts;
use super::{Advisor, AdvisorError};
use crate::config::AdvisorConfig;
use crate::models::{AnalysisReport, ModificationResult, PresetInfo, Stats, Suggestion};

/// Gemini HTTP API 어드바이저
#[derive(Clone)]
pub struct GeminiAdvisor {
    client: Client,
    config: AdvisorConfig,
}

impl GeminiAdvisor {
    pub fn new(config: AdvisorConfig) -> Result<Self, AdvisorError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AdvisorError::Request(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// API 키는 URL이 아닌 헤더로만 전달 (에러 메시지/로그에 URL이 포함됨)
    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.config.base_url, self.config.model)
    }

    /// 스키마를 지정해 요청하고 첫 후보의 텍스트를 반환
    async fn generate(&self, prompt: String, schema: Value) -> Result<String, AdvisorError> {
        let body = GenerateContentRequest::structured(prompt, schema);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AdvisorError::Timeout(self.config.timeout.as_secs())
                } else {
                    AdvisorError::Request(format!("Gemini API request failed: {}", e.without_url()))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &body_text));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            AdvisorError::MalformedResponse(format!(
                "Failed to parse Gemini response: {}",
                e.without_url()
            ))
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl Advisor for GeminiAdvisor {
    async fn modify(
        &self,
        document: &str,
        instruction: &str,
    ) -> Result<ModificationResult, AdvisorError> {
        tracing::debug!("[Gemini] modify ({} chars)", document.len());
        let text = self
            .generate(prompts::modify_prompt(document, instruction), prompts::modify_schema())
            .await?;
        parse_modification(&text)
    }

    async fn analyze(&self, document: &str) -> Result<AnalysisReport, AdvisorError> {
        tracing::debug!("[Gemini] analyze");
        let text = self
            .generate(prompts::analyze_prompt(document), prompts::analyze_schema())
            .await?;
        Ok(parse_analysis(&text))
    }

    async fn extract_stats(&self, document: &str) -> Result<Stats, AdvisorError> {
        tracing::debug!("[Gemini] extract_stats");
        let text = self
            .generate(prompts::stats_prompt(document), prompts::stats_schema())
            .await?;
        Ok(parse_stats(&text))
    }

    async fn suggest_elements(&self, document: &str) -> Result<Vec<Suggestion>, AdvisorError> {
        tracing::debug!("[Gemini] suggest_elements");
        let text = self
            .generate(prompts::suggest_prompt(document), prompts::suggest_schema())
            .await?;
        Ok(parse_suggestions(&text))
    }

    async fn get_presets(&self, element_name: &str) -> Result<PresetInfo, AdvisorError> {
        tracing::debug!("[Gemini] get_presets: {}", element_name);
        let text = self
            .generate(prompts::presets_prompt(element_name), prompts::presets_schema())
            .await?;
        Ok(parse_presets(&text))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    fn structured(prompt: String, schema: Value) -> Self {
        Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: schema,
            },
        }
    }
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String, AdvisorError> {
    let text: String = response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AdvisorError::EmptyResponse);
    }
    Ok(text)
}

fn map_http_error(status: StatusCode, body: &str) -> AdvisorError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() {
                msg
            } else {
                format!("{}: {}", status_text, msg)
            }
        })
        .unwrap_or_else(|_| body.to_string());

    AdvisorError::Http {
        status: status.as_u16(),
        message,
    }
}
